//! Colors.
//!
//! Colors handed to the renderer are 8-bit RGBA with **premultiplied** alpha,
//! i.e. every color channel has already been scaled by the alpha channel. PDF
//! color operators on the other hand take straight (non-premultiplied)
//! components and keep the opacity in a separate graphics state, so colors
//! have to be split up before they can be written.

/// An 8-bit RGBA color with premultiplied alpha.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Rgba {
    /// The red channel, premultiplied by alpha.
    pub r: u8,
    /// The green channel, premultiplied by alpha.
    pub g: u8,
    /// The blue channel, premultiplied by alpha.
    pub b: u8,
    /// The alpha channel. 0 means fully transparent.
    pub a: u8,
}

impl Rgba {
    /// A fully transparent color.
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    /// Create a new color from already premultiplied channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create a new color from straight (non-premultiplied) channels.
    pub fn from_straight(r: u8, g: u8, b: u8, a: u8) -> Self {
        let premultiply = |v: u8| ((v as u16 * a as u16 + 127) / 255) as u8;
        Self::new(premultiply(r), premultiply(g), premultiply(b), a)
    }

    /// Whether the color is fully transparent.
    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Divide the alpha back out of the color channels.
    ///
    /// The result is truncated and saturates at 255. A fully transparent color
    /// yields black, since its color channels carry no information.
    pub fn unpremultiply(&self) -> [u8; 3] {
        if self.a == 0 {
            return [0, 0, 0];
        }

        let alpha = self.a as f32 / 255.0;
        // Float to int casts saturate.
        let adjusted = |v: u8| (v as f32 / alpha) as u8;

        [adjusted(self.r), adjusted(self.g), adjusted(self.b)]
    }

    /// The alpha channel as a value between 0 and 1.
    pub fn alpha(&self) -> f32 {
        self.a as f32 / 255.0
    }

    /// The straight color components, normalized to the range 0 to 1, as
    /// expected by the `rg`/`RG` operators.
    pub(crate) fn to_pdf_rgb(&self) -> [f32; 3] {
        self.unpremultiply().map(|c| c as f32 / 255.0)
    }
}
