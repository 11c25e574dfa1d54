use sketch_score_types::{BACKGROUND, INK};

const HIST_BINS: usize = 256;

/// Out-of-range sample policy for neighbourhood filters.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Border {
    /// `dcb|abcd|cba`, edge sample not repeated.
    Reflect101,
    /// `aaa|abcd|ddd`.
    Replicate,
}

impl Border {
    fn resolve(self, index: isize, len: usize) -> usize {
        let last = len as isize - 1;
        if last <= 0 {
            return 0;
        }
        match self {
            Border::Replicate => index.clamp(0, last) as usize,
            Border::Reflect101 => {
                let mut i = index;
                while i < 0 || i > last {
                    if i < 0 {
                        i = -i;
                    }
                    if i > last {
                        i = 2 * last - i;
                    }
                }
                i as usize
            }
        }
    }
}

/// Contrast-limited adaptive histogram equalization over a `tiles_x` x `tiles_y` grid.
///
/// Images that do not divide evenly into the grid are padded on the right and
/// bottom with a reflected border before histograms are gathered; the output
/// keeps the input dimensions. Each pixel blends the lookup tables of the four
/// nearest tile centres bilinearly.
pub fn clahe(
    pixels: &[u8],
    width: usize,
    height: usize,
    tiles_x: usize,
    tiles_y: usize,
    clip_limit: f64,
) -> Vec<u8> {
    assert_eq!(pixels.len(), width * height);
    if width == 0 || height == 0 || tiles_x == 0 || tiles_y == 0 {
        return pixels.to_vec();
    }

    let padded = width % tiles_x != 0 || height % tiles_y != 0;
    let (padded_w, padded_h) = if padded {
        (
            width + tiles_x - width % tiles_x,
            height + tiles_y - height % tiles_y,
        )
    } else {
        (width, height)
    };
    let tile_w = padded_w / tiles_x;
    let tile_h = padded_h / tiles_y;
    let tile_area = tile_w * tile_h;

    let clip = if clip_limit > 0.0 {
        ((clip_limit * tile_area as f64 / HIST_BINS as f64) as usize).max(1)
    } else {
        0
    };
    let lut_scale = (HIST_BINS - 1) as f64 / tile_area as f64;

    let sample = |x: usize, y: usize| -> u8 {
        let sx = Border::Reflect101.resolve(x as isize, width);
        let sy = Border::Reflect101.resolve(y as isize, height);
        pixels[sy * width + sx]
    };

    let mut luts = vec![0u8; tiles_x * tiles_y * HIST_BINS];
    let mut hist = [0usize; HIST_BINS];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            hist.fill(0);
            for y in ty * tile_h..(ty + 1) * tile_h {
                for x in tx * tile_w..(tx + 1) * tile_w {
                    hist[sample(x, y) as usize] += 1;
                }
            }
            if clip > 0 {
                clip_histogram(&mut hist, clip);
            }
            let lut = &mut luts[(ty * tiles_x + tx) * HIST_BINS..][..HIST_BINS];
            let mut sum = 0usize;
            for (slot, &count) in lut.iter_mut().zip(hist.iter()) {
                sum += count;
                *slot = (sum as f64 * lut_scale).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    let axis = |pos: usize, tile: usize, tiles: usize| -> (usize, usize, f64) {
        let f = pos as f64 / tile as f64 - 0.5;
        let lo = f.floor();
        let frac = f - lo;
        let lo = lo as isize;
        let hi = (lo + 1).min(tiles as isize - 1);
        (lo.max(0) as usize, hi.max(0) as usize, frac)
    };

    let mut output = vec![0u8; pixels.len()];
    for y in 0..height {
        let (ty1, ty2, ya) = axis(y, tile_h, tiles_y);
        let ya1 = 1.0 - ya;
        for x in 0..width {
            let (tx1, tx2, xa) = axis(x, tile_w, tiles_x);
            let xa1 = 1.0 - xa;
            let v = pixels[y * width + x] as usize;
            let lut = |tx: usize, ty: usize| luts[(ty * tiles_x + tx) * HIST_BINS + v] as f64;
            let top = lut(tx1, ty1) * xa1 + lut(tx2, ty1) * xa;
            let bottom = lut(tx1, ty2) * xa1 + lut(tx2, ty2) * xa;
            let value = top * ya1 + bottom * ya;
            output[y * width + x] = value.round().clamp(0.0, 255.0) as u8;
        }
    }
    output
}

fn clip_histogram(hist: &mut [usize; HIST_BINS], clip: usize) {
    let mut clipped = 0usize;
    for count in hist.iter_mut() {
        if *count > clip {
            clipped += *count - clip;
            *count = clip;
        }
    }
    let batch = clipped / HIST_BINS;
    let mut residual = clipped - batch * HIST_BINS;
    for count in hist.iter_mut() {
        *count += batch;
    }
    if residual > 0 {
        let step = (HIST_BINS / residual).max(1);
        let mut i = 0;
        while i < HIST_BINS && residual > 0 {
            hist[i] += 1;
            residual -= 1;
            i += step;
        }
    }
}

/// Normalized 1D Gaussian kernel of odd length `size`.
///
/// A non-positive `sigma` derives one from the size; sizes up to 7 then use the
/// fixed binomial taps.
pub fn gaussian_kernel(size: usize, sigma: f64) -> Vec<f64> {
    const SMALL: [&[f64]; 4] = [
        &[1.0],
        &[0.25, 0.5, 0.25],
        &[0.0625, 0.25, 0.375, 0.25, 0.0625],
        &[0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
    ];
    if sigma <= 0.0 && size % 2 == 1 && size <= 7 {
        return SMALL[size / 2].to_vec();
    }
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8
    };
    let center = (size as f64 - 1.0) * 0.5;
    let scale = -0.5 / (sigma * sigma);
    let mut kernel: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (scale * d * d).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    for tap in kernel.iter_mut() {
        *tap /= sum;
    }
    kernel
}

/// Separable Gaussian blur on an 8-bit plane with a square `size` kernel.
pub fn gaussian_blur(
    pixels: &[u8],
    width: usize,
    height: usize,
    size: usize,
    sigma: f64,
    border: Border,
) -> Vec<u8> {
    assert_eq!(pixels.len(), width * height);
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let kernel = gaussian_kernel(size, sigma);
    let radius = (kernel.len() / 2) as isize;

    let mut rows = vec![0.0f64; pixels.len()];
    for y in 0..height {
        let src = &pixels[y * width..(y + 1) * width];
        let dst = &mut rows[y * width..(y + 1) * width];
        for (x, slot) in dst.iter_mut().enumerate() {
            let mut sum = 0.0;
            for (k, &w) in kernel.iter().enumerate() {
                let sx = border.resolve(x as isize + k as isize - radius, width);
                sum += src[sx] as f64 * w;
            }
            *slot = sum;
        }
    }

    let mut output = vec![0u8; pixels.len()];
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0;
            for (k, &w) in kernel.iter().enumerate() {
                let sy = border.resolve(y as isize + k as isize - radius, height);
                sum += rows[sy * width + x] * w;
            }
            output[y * width + x] = sum.round().clamp(0.0, 255.0) as u8;
        }
    }
    output
}

/// Inverted adaptive threshold against a Gaussian-weighted local mean.
///
/// A pixel becomes ink when it is at least `offset` darker than the mean of
/// its `block_size` neighbourhood.
pub fn adaptive_threshold_inv(
    pixels: &[u8],
    width: usize,
    height: usize,
    block_size: usize,
    offset: f64,
) -> Vec<u8> {
    let mean = gaussian_blur(pixels, width, height, block_size, 0.0, Border::Replicate);
    let delta = offset.floor() as i32;
    pixels
        .iter()
        .zip(mean.iter())
        .map(|(&value, &local)| {
            if value as i32 - local as i32 <= -delta {
                INK
            } else {
                BACKGROUND
            }
        })
        .collect()
}

/// Area resampling to `new_width` x `new_height`.
///
/// Shrinking averages every covered source pixel by its fractional overlap.
/// Enlarging on either axis falls back to area-weighted linear taps.
pub fn resize_area(
    pixels: &[u8],
    width: usize,
    height: usize,
    new_width: usize,
    new_height: usize,
) -> Vec<u8> {
    assert_eq!(pixels.len(), width * height);
    if width == 0 || height == 0 || new_width == 0 || new_height == 0 {
        return vec![0; new_width * new_height];
    }
    if width == new_width && height == new_height {
        return pixels.to_vec();
    }
    let scale_x = width as f64 / new_width as f64;
    let scale_y = height as f64 / new_height as f64;
    let (taps_x, taps_y) = if scale_x >= 1.0 && scale_y >= 1.0 {
        (
            area_taps(width, new_width, scale_x),
            area_taps(height, new_height, scale_y),
        )
    } else {
        (
            linear_area_taps(width, new_width, scale_x),
            linear_area_taps(height, new_height, scale_y),
        )
    };

    let mut rows = vec![0.0f64; width * new_height];
    for (ny, taps) in taps_y.iter().enumerate() {
        let dst = &mut rows[ny * width..(ny + 1) * width];
        for &(sy, w) in taps {
            let src = &pixels[sy * width..(sy + 1) * width];
            for (slot, &value) in dst.iter_mut().zip(src.iter()) {
                *slot += value as f64 * w;
            }
        }
    }

    let mut output = vec![0u8; new_width * new_height];
    for ny in 0..new_height {
        let src = &rows[ny * width..(ny + 1) * width];
        for (nx, taps) in taps_x.iter().enumerate() {
            let sum: f64 = taps.iter().map(|&(sx, w)| src[sx] * w).sum();
            output[ny * new_width + nx] = sum.round().clamp(0.0, 255.0) as u8;
        }
    }
    output
}

fn area_taps(len: usize, new_len: usize, scale: f64) -> Vec<Vec<(usize, f64)>> {
    let mut taps = Vec::with_capacity(new_len);
    for d in 0..new_len {
        let f1 = d as f64 * scale;
        let f2 = f1 + scale;
        let cell = scale.min(len as f64 - f1);
        let s2 = (f2.floor() as usize).min(len - 1);
        let s1 = (f1.ceil() as usize).min(s2);
        let mut entry = Vec::with_capacity(scale.ceil() as usize + 2);
        if s1 as f64 - f1 > 1e-3 {
            entry.push((s1 - 1, (s1 as f64 - f1) / cell));
        }
        for s in s1..s2 {
            entry.push((s, 1.0 / cell));
        }
        if f2 - s2 as f64 > 1e-3 {
            let w = (f2 - s2 as f64).min(1.0).min(cell);
            entry.push((s2, w / cell));
        }
        taps.push(entry);
    }
    taps
}

fn linear_area_taps(len: usize, new_len: usize, scale: f64) -> Vec<Vec<(usize, f64)>> {
    let inv_scale = new_len as f64 / len as f64;
    (0..new_len)
        .map(|d| {
            let mut s = (d as f64 * scale).floor() as isize;
            let f = (d + 1) as f64 - (s + 1) as f64 * inv_scale;
            let mut f = if f <= 0.0 { 0.0 } else { f - f.floor() };
            if s < 0 {
                s = 0;
                f = 0.0;
            }
            if s as usize >= len - 1 {
                s = len as isize - 1;
                f = 0.0;
            }
            let s = s as usize;
            if f == 0.0 {
                vec![(s, 1.0)]
            } else {
                vec![(s, 1.0 - f), (s + 1, f)]
            }
        })
        .collect()
}

/// Fixed-level threshold: samples strictly above `level` become ink.
pub fn threshold_binary(pixels: &[u8], level: u8) -> Vec<u8> {
    pixels
        .iter()
        .map(|&v| if v > level { INK } else { BACKGROUND })
        .collect()
}

/// Dilation with a solid `kernel_w` x `kernel_h` rectangle anchored at its centre
/// (`kernel / 2`). Pixels outside the image never contribute ink.
pub fn dilate_rect(
    mask: &[u8],
    width: usize,
    height: usize,
    kernel_w: usize,
    kernel_h: usize,
    iterations: usize,
) -> Vec<u8> {
    assert_eq!(mask.len(), width * height);
    let mut current = mask.to_vec();
    if width == 0 || height == 0 || kernel_w == 0 || kernel_h == 0 {
        return current;
    }
    let anchor_x = (kernel_w / 2) as isize;
    let anchor_y = (kernel_h / 2) as isize;
    let mut next = vec![BACKGROUND; mask.len()];
    for _ in 0..iterations {
        for y in 0..height {
            for x in 0..width {
                let mut value = BACKGROUND;
                'outer: for ky in 0..kernel_h as isize {
                    let sy = y as isize + ky - anchor_y;
                    if sy < 0 || sy >= height as isize {
                        continue;
                    }
                    for kx in 0..kernel_w as isize {
                        let sx = x as isize + kx - anchor_x;
                        if sx < 0 || sx >= width as isize {
                            continue;
                        }
                        if current[sy as usize * width + sx as usize] != BACKGROUND {
                            value = INK;
                            break 'outer;
                        }
                    }
                }
                next[y * width + x] = value;
            }
        }
        current.copy_from_slice(&next);
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflect101_mirrors_without_repeating_edge() {
        assert_eq!(Border::Reflect101.resolve(-1, 5), 1);
        assert_eq!(Border::Reflect101.resolve(-2, 5), 2);
        assert_eq!(Border::Reflect101.resolve(5, 5), 3);
        assert_eq!(Border::Reflect101.resolve(12, 5), 4);
        assert_eq!(Border::Reflect101.resolve(3, 1), 0);
        assert_eq!(Border::Replicate.resolve(-4, 5), 0);
        assert_eq!(Border::Replicate.resolve(9, 5), 4);
    }

    #[test]
    fn gaussian_kernel_is_normalized() {
        let small = gaussian_kernel(5, 0.0);
        assert_eq!(small, vec![0.0625, 0.25, 0.375, 0.25, 0.0625]);
        let large = gaussian_kernel(41, 0.0);
        assert_eq!(large.len(), 41);
        let sum: f64 = large.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(large[20] > large[19]);
        assert!((large[0] - large[40]).abs() < 1e-12);
    }

    #[test]
    fn gaussian_blur_keeps_flat_images_flat() {
        let flat = vec![137u8; 9 * 7];
        assert_eq!(
            gaussian_blur(&flat, 9, 7, 5, 0.0, Border::Reflect101),
            flat
        );
        assert_eq!(gaussian_blur(&flat, 9, 7, 41, 0.0, Border::Replicate), flat);
    }

    #[test]
    fn clahe_leaves_uniform_image_uniform() {
        let flat = vec![90u8; 32 * 24];
        let out = clahe(&flat, 32, 24, 8, 8, 2.0);
        assert!(out.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn clahe_handles_sizes_not_divisible_by_grid() {
        let pixels: Vec<u8> = (0..(13 * 11)).map(|i| (i * 7 % 256) as u8).collect();
        let out = clahe(&pixels, 13, 11, 8, 8, 2.0);
        assert_eq!(out.len(), pixels.len());
    }

    #[test]
    fn clahe_preserves_ordering_across_tiles() {
        let pixels: Vec<u8> = (0..64 * 64)
            .map(|i| if (i % 64) < 32 { 120 } else { 130 })
            .collect();
        let out = clahe(&pixels, 64, 64, 8, 8, 2.0);
        let left = out[32 * 64 + 4];
        let right = out[32 * 64 + 60];
        assert!(right > left, "left={left} right={right}");
    }

    #[test]
    fn clip_redistributes_excess() {
        let mut hist = [0usize; HIST_BINS];
        hist[10] = 600;
        clip_histogram(&mut hist, 100);
        assert_eq!(hist.iter().sum::<usize>(), 600);
        assert!(hist[10] >= 100 && hist[10] <= 103);
    }

    #[test]
    fn adaptive_threshold_marks_dark_strokes() {
        let width = 60;
        let height = 60;
        let mut pixels = vec![220u8; width * height];
        for y in 10..50 {
            pixels[y * width + 30] = 40;
        }
        let out = adaptive_threshold_inv(&pixels, width, height, 41, 10.0);
        assert_eq!(out[20 * width + 30], INK);
        assert_eq!(out[20 * width + 5], BACKGROUND);
    }

    #[test]
    fn resize_area_averages_blocks() {
        let pixels = vec![0u8, 255, 0, 255, 0, 255, 0, 255];
        let out = resize_area(&pixels, 4, 2, 2, 1);
        assert_eq!(out, vec![128, 128]);
    }

    #[test]
    fn resize_area_handles_fractional_shrink() {
        let pixels = vec![255u8; 7 * 5];
        let out = resize_area(&pixels, 7, 5, 3, 2);
        assert!(out.iter().all(|&v| v == 255));
    }

    #[test]
    fn resize_area_enlarges_without_gaps() {
        let pixels = vec![255u8, 0, 0, 255];
        let out = resize_area(&pixels, 2, 2, 6, 6);
        assert_eq!(out.len(), 36);
        assert_eq!(out[0], 255);
        assert_eq!(out[35], 255);
        assert_eq!(out[5], 0);
    }

    #[test]
    fn threshold_is_strict() {
        assert_eq!(
            threshold_binary(&[126, 127, 128, 255], 127),
            vec![0, 0, 255, 255]
        );
    }

    #[test]
    fn dilate_2x2_grows_right_and_down() {
        let mut mask = vec![BACKGROUND; 25];
        mask[2 * 5 + 2] = INK;
        let out = dilate_rect(&mask, 5, 5, 2, 2, 1);
        let ink: Vec<usize> = out
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == INK)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(ink, vec![2 * 5 + 2, 2 * 5 + 3, 3 * 5 + 2, 3 * 5 + 3]);
    }
}
