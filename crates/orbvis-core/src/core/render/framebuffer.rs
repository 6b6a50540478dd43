/// An RGBA render target with a depth channel.
///
/// Color samples are linear-space f32 until the final gamma encode; depth is
/// view-space distance, `f64::INFINITY` for background pixels. Pixels are
/// stored row-major from the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    color: Vec<[f32; 4]>,
    depth: Vec<f64>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            color: vec![[0.0; 4]; len],
            depth: vec![f64::INFINITY; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn color_at(&self, x: u32, y: u32) -> [f32; 4] {
        self.color[self.index(x, y)]
    }

    #[inline]
    pub fn depth_at(&self, x: u32, y: u32) -> f64 {
        self.depth[self.index(x, y)]
    }

    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [f32; 4], depth: f64) {
        let index = self.index(x, y);
        self.color[index] = color;
        self.depth[index] = depth;
    }

    #[inline]
    pub fn set_color(&mut self, x: u32, y: u32, color: [f32; 4]) {
        let index = self.index(x, y);
        self.color[index] = color;
    }

    /// Mutable view of one row of color samples, for parallel row rendering.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = (u32, &mut [[f32; 4]], &mut [f64])> {
        let width = self.width as usize;
        self.color
            .chunks_mut(width)
            .zip(self.depth.chunks_mut(width))
            .enumerate()
            .map(|(y, (color, depth))| (y as u32, color, depth))
    }

    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_framebuffer_is_transparent_and_infinitely_deep() {
        let fb = Framebuffer::new(4, 3);
        assert_eq!(fb.color_at(0, 0), [0.0; 4]);
        assert_eq!(fb.color_at(3, 2), [0.0; 4]);
        assert!(fb.depth_at(1, 1).is_infinite());
    }

    #[test]
    fn pixel_writes_round_trip() {
        let mut fb = Framebuffer::new(4, 3);
        fb.set_pixel(2, 1, [0.5, 0.25, 1.0, 1.0], 3.5);
        assert_eq!(fb.color_at(2, 1), [0.5, 0.25, 1.0, 1.0]);
        assert_eq!(fb.depth_at(2, 1), 3.5);
        assert_eq!(fb.color_at(1, 2), [0.0; 4]);
    }

    #[test]
    fn rows_iterate_top_down() {
        let mut fb = Framebuffer::new(2, 2);
        for (y, colors, depths) in fb.rows_mut() {
            for (x, pixel) in colors.iter_mut().enumerate() {
                pixel[0] = y as f32 * 10.0 + x as f32;
            }
            depths[0] = y as f64;
        }
        assert_eq!(fb.color_at(1, 0)[0], 1.0);
        assert_eq!(fb.color_at(0, 1)[0], 10.0);
        assert_eq!(fb.depth_at(0, 1), 1.0);
    }
}
