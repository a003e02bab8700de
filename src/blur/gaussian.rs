//! Gaussian region blur
//!
//! The region is copied out per channel, smoothed with a separable Gaussian
//! kernel (edges replicated at the region border, so pixels outside the
//! region never leak in) and written back.

use image::RgbImage;

use super::types::Region;

/// Round an arbitrary kernel size up to the next odd value
pub fn odd_kernel_size(ksize: u32) -> usize {
    let k = ksize.max(1) as usize;
    if k % 2 == 0 {
        k + 1
    } else {
        k
    }
}

/// Sigma implied by a kernel size when none is given explicitly
pub fn sigma_for_kernel(size: usize) -> f32 {
    0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Generate a normalized 1D Gaussian kernel
pub fn gaussian_kernel(size: usize, sigma: f32) -> Vec<f32> {
    let half = (size / 2) as i32;
    let mut kernel = Vec::with_capacity(size);
    let mut sum = 0.0f32;

    for i in 0..size {
        let x = (i as i32 - half) as f32;
        let g = (-x * x / (2.0 * sigma * sigma)).exp();
        kernel.push(g);
        sum += g;
    }

    for k in &mut kernel {
        *k /= sum;
    }

    kernel
}

/// Separable 2D convolution with edge replication
pub fn convolve_separable(data: &[f32], width: usize, height: usize, kernel: &[f32]) -> Vec<f32> {
    let k_half = (kernel.len() / 2) as i64;
    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;

    // Horizontal pass
    let mut temp = vec![0.0f32; width * height];
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0f32;
            for (ki, &kv) in kernel.iter().enumerate() {
                let sx = (x as i64 + ki as i64 - k_half).clamp(0, max_x) as usize;
                sum += data[y * width + sx] * kv;
            }
            temp[y * width + x] = sum;
        }
    }

    // Vertical pass
    let mut result = vec![0.0f32; width * height];
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0f32;
            for (ki, &kv) in kernel.iter().enumerate() {
                let sy = (y as i64 + ki as i64 - k_half).clamp(0, max_y) as usize;
                sum += temp[sy * width + x] * kv;
            }
            result[y * width + x] = sum;
        }
    }

    result
}

/// Blur `region` of `image` in place with a Gaussian of kernel size `ksize`
///
/// Even kernel sizes are bumped to the next odd value. The region must
/// already be clipped; an empty region leaves the image untouched.
pub fn blur_region(image: &mut RgbImage, region: Region, ksize: u32) {
    if region.is_empty() {
        return;
    }

    let size = odd_kernel_size(ksize);
    if size == 1 {
        return;
    }
    let kernel = gaussian_kernel(size, sigma_for_kernel(size));

    let w = region.width as usize;
    let h = region.height as usize;
    let mut channel_data = vec![0.0f32; w * h];

    for channel in 0..3 {
        for ry in 0..h {
            for rx in 0..w {
                let px = image.get_pixel(region.x + rx as u32, region.y + ry as u32);
                channel_data[ry * w + rx] = px.0[channel] as f32;
            }
        }

        let blurred = convolve_separable(&channel_data, w, h, &kernel);

        for ry in 0..h {
            for rx in 0..w {
                let px = image.get_pixel_mut(region.x + rx as u32, region.y + ry as u32);
                px.0[channel] = blurred[ry * w + rx].round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}
