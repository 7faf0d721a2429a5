/// A named point of interest on the Mandelbrot set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PresetCoordinate {
    pub x: f32,
    pub y: f32,
    pub name: &'static str,
}

impl PresetCoordinate {
    const fn new(x: f32, y: f32, name: &'static str) -> Self {
        Self { x, y, name }
    }

    pub fn position(&self) -> [f32; 2] {
        [self.x, self.y]
    }

    pub fn distance_to(&self, point: [f32; 2]) -> f32 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        (dx * dx + dy * dy).sqrt()
    }
}

pub const PRESETS: [PresetCoordinate; 8] = [
    PresetCoordinate::new(-0.743_643_9, 0.131_825_9, "Seahorse Valley"),
    PresetCoordinate::new(0.285, 0.01, "Elephant Valley"),
    PresetCoordinate::new(-0.088, 0.654, "Triple Spiral"),
    PresetCoordinate::new(-1.768_778_8, -0.001_739, "Mini Mandelbrot"),
    PresetCoordinate::new(-1.36, 0.005, "Scepter Valley"),
    PresetCoordinate::new(-0.226_266_6, 1.116_174_4, "Tendrils"),
    PresetCoordinate::new(-0.170_337, -1.065_06, "Lightning"),
    PresetCoordinate::new(-0.374_004_1, 0.659_792_2, "Starfish"),
];

/// Index and distance of the catalogue entry closest to `point`.
pub fn nearest(point: [f32; 2]) -> (usize, f32) {
    PRESETS
        .iter()
        .enumerate()
        .map(|(i, p)| (i, p.distance_to(point)))
        .fold((0, f32::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        for (i, a) in PRESETS.iter().enumerate() {
            for b in &PRESETS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn test_nearest_finds_exact_preset() {
        for (i, p) in PRESETS.iter().enumerate() {
            let (idx, dist) = nearest(p.position());
            assert_eq!(idx, i);
            assert_eq!(dist, 0.0);
        }
    }
}
