//! Point lights and their uniform layout.

/// Number of lights the entity and terrain shaders evaluate.
pub const MAX_LIGHTS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub position: cgmath::Vector3<f32>,
    pub colour: cgmath::Vector3<f32>,
    /// Constant, linear and quadratic falloff factors.
    pub attenuation: cgmath::Vector3<f32>,
}

impl Light {
    /// A light that does not fade with distance, like the sun.
    pub fn new(position: cgmath::Vector3<f32>, colour: cgmath::Vector3<f32>) -> Self {
        Self::with_attenuation(position, colour, cgmath::Vector3::new(1.0, 0.0, 0.0))
    }

    pub fn with_attenuation(
        position: cgmath::Vector3<f32>,
        colour: cgmath::Vector3<f32>,
        attenuation: cgmath::Vector3<f32>,
    ) -> Self {
        Self {
            position,
            colour,
            attenuation,
        }
    }

    pub fn to_raw(&self) -> LightRaw {
        LightRaw {
            position: self.position.extend(1.0).into(),
            colour: self.colour.extend(0.0).into(),
            attenuation: self.attenuation.extend(0.0).into(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightRaw {
    // vec3s are padded to vec4 to honour the 16 byte uniform alignment
    pub position: [f32; 4],
    pub colour: [f32; 4],
    pub attenuation: [f32; 4],
}

impl LightRaw {
    /// An unused slot: black, and an attenuation of one so the shader never
    /// divides by zero.
    pub const EMPTY: LightRaw = LightRaw {
        position: [0.0; 4],
        colour: [0.0; 4],
        attenuation: [1.0, 0.0, 0.0, 0.0],
    };
}

/// Pack `lights` into the fixed-size array the shaders expect. Lights past
/// [`MAX_LIGHTS`] are dropped.
pub fn pack_lights(lights: &[Light]) -> [LightRaw; MAX_LIGHTS] {
    if lights.len() > MAX_LIGHTS {
        log::warn!(
            "{} lights submitted but only the first {} are rendered",
            lights.len(),
            MAX_LIGHTS
        );
    }
    let mut packed = [LightRaw::EMPTY; MAX_LIGHTS];
    for (slot, light) in packed.iter_mut().zip(lights) {
        *slot = light.to_raw();
    }
    packed
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    fn sun() -> Light {
        Light::new(Vector3::new(0.0, 1000.0, -7000.0), Vector3::new(0.4, 0.4, 0.4))
    }

    #[test]
    fn pads_missing_lights_with_neutral_slots() {
        let packed = pack_lights(&[sun()]);
        assert_eq!(packed[0].position, [0.0, 1000.0, -7000.0, 1.0]);
        assert_eq!(packed[0].colour, [0.4, 0.4, 0.4, 0.0]);
        for slot in &packed[1..] {
            assert_eq!(*slot, LightRaw::EMPTY);
            assert_eq!(slot.attenuation[0], 1.0);
        }
    }

    #[test]
    fn drops_lights_beyond_the_limit() {
        let lamp = |x: f32| {
            Light::with_attenuation(
                Vector3::new(x, 10.0, 0.0),
                Vector3::new(2.0, 0.0, 0.0),
                Vector3::new(1.0, 0.01, 0.002),
            )
        };
        let lights: Vec<Light> = (0..6).map(|i| lamp(i as f32)).collect();
        let packed = pack_lights(&lights);
        assert_eq!(packed.len(), MAX_LIGHTS);
        assert_eq!(packed[3].position[0], 3.0);
        assert_eq!(packed[3].attenuation, [1.0, 0.01, 0.002, 0.0]);
    }

    #[test]
    fn no_lights_means_all_slots_empty() {
        assert!(pack_lights(&[]).iter().all(|slot| *slot == LightRaw::EMPTY));
    }
}
