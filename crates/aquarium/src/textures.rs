//! Procedural stand-ins for the tank's image assets.

use aquarium_engine::render::{Context, RenderBackend, Result, Texture, ViewDimension};

const SIZE: u32 = 64;

/// Two-tone checker, `cells` squares per side.
pub fn checker(a: [u8; 4], b: [u8; 4], cells: u32) -> Vec<u8> {
    let cell = (SIZE / cells.max(1)).max(1);
    let mut pixels = Vec::with_capacity((SIZE * SIZE * 4) as usize);
    for y in 0..SIZE {
        for x in 0..SIZE {
            let even = ((x / cell) + (y / cell)) % 2 == 0;
            pixels.extend_from_slice(if even { &a } else { &b });
        }
    }
    pixels
}

/// Tangent-space normal map pointing straight out of the surface.
pub fn flat_normal() -> Vec<u8> {
    solid([128, 128, 255, 255])
}

pub fn solid(color: [u8; 4]) -> Vec<u8> {
    color.repeat((SIZE * SIZE) as usize)
}

/// Vertical gradient from `top` to `bottom`.
pub fn gradient(top: [u8; 4], bottom: [u8; 4]) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((SIZE * SIZE * 4) as usize);
    for y in 0..SIZE {
        let t = y as f32 / (SIZE - 1) as f32;
        let row: [u8; 4] = std::array::from_fn(|c| {
            (top[c] as f32 + (bottom[c] as f32 - top[c] as f32) * t).round() as u8
        });
        for _ in 0..SIZE {
            pixels.extend_from_slice(&row);
        }
    }
    pixels
}

/// Every texture the scene samples.
#[derive(Debug)]
pub struct TankTextures {
    pub sand: Texture,
    pub rock: Texture,
    pub seaweed: Texture,
    pub fish: Texture,
    pub glass: Texture,
    pub backdrop: Texture,
    pub normal_map: Texture,
    pub reflection_map: Texture,
    pub skybox: Texture,
}

impl TankTextures {
    pub fn create<B: RenderBackend>(ctx: &mut Context<B>) -> Result<Self> {
        fn d2<B: RenderBackend>(
            ctx: &mut Context<B>,
            name: &str,
            pixels: Vec<u8>,
        ) -> Result<Texture> {
            ctx.create_texture_from_rgba(name, ViewDimension::D2, SIZE, SIZE, &[pixels.as_slice()])
        }

        let sand = d2(ctx, "sand", checker([194, 178, 128, 255], [176, 160, 112, 255], 8))?;
        let rock = d2(ctx, "rock", checker([96, 96, 104, 255], [72, 72, 80, 255], 4))?;
        let seaweed = d2(ctx, "seaweed", gradient([40, 140, 60, 255], [20, 90, 30, 255]))?;
        let fish = d2(ctx, "fish", checker([250, 140, 40, 255], [250, 250, 250, 255], 2))?;
        let glass = d2(ctx, "glass", solid([20, 30, 40, 255]))?;
        let backdrop = d2(ctx, "backdrop", gradient([0, 120, 180, 255], [0, 40, 80, 255]))?;
        let normal_map = d2(ctx, "normal map", flat_normal())?;
        let reflection_map = d2(ctx, "reflection map", solid([64, 64, 64, 255]))?;

        let sky = gradient([120, 200, 255, 255], [10, 60, 120, 255]);
        let faces: Vec<&[u8]> = (0..6).map(|_| sky.as_slice()).collect();
        let skybox =
            ctx.create_texture_from_rgba("skybox", ViewDimension::Cube, SIZE, SIZE, &faces)?;

        Ok(Self {
            sand,
            rock,
            seaweed,
            fish,
            glass,
            backdrop,
            normal_map,
            reflection_map,
            skybox,
        })
    }

    pub fn destroy<B: RenderBackend>(self, ctx: &mut Context<B>) {
        for texture in [
            self.sand,
            self.rock,
            self.seaweed,
            self.fish,
            self.glass,
            self.backdrop,
            self.normal_map,
            self.reflection_map,
            self.skybox,
        ] {
            ctx.destroy_texture(texture);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_images_are_tightly_packed_rgba() {
        let len = (SIZE * SIZE * 4) as usize;
        assert_eq!(checker([0; 4], [255; 4], 8).len(), len);
        assert_eq!(flat_normal().len(), len);
        assert_eq!(gradient([0; 4], [255; 4]).len(), len);
    }

    #[test]
    fn checker_alternates() {
        let pixels = checker([1, 1, 1, 1], [2, 2, 2, 2], 2);
        let half = (SIZE / 2) as usize;
        assert_eq!(pixels[0], 1);
        assert_eq!(pixels[half * 4], 2);
    }

    #[test]
    fn gradient_hits_both_ends() {
        let pixels = gradient([0, 0, 0, 255], [200, 100, 50, 255]);
        assert_eq!(&pixels[..4], &[0, 0, 0, 255]);
        assert_eq!(&pixels[pixels.len() - 4..], &[200, 100, 50, 255]);
    }
}
