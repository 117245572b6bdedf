use serde::{Deserialize, Serialize};

/// The detectable object classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectClass {
    /// Passenger cars.
    Car,
    /// Cyclists, rider and bicycle together.
    Cyclist,
    /// Pedestrians.
    Pedestrian,
}

impl ObjectClass {
    /// All classes in their canonical id order.
    pub const ALL: [ObjectClass; 3] = [
        ObjectClass::Car,
        ObjectClass::Cyclist,
        ObjectClass::Pedestrian,
    ];

    /// Parses a KITTI type name; unknown names (e.g. `DontCare`, `Van`) yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Car" => Some(ObjectClass::Car),
            "Cyclist" => Some(ObjectClass::Cyclist),
            "Pedestrian" => Some(ObjectClass::Pedestrian),
            _ => None,
        }
    }

    /// The KITTI type name.
    pub fn name(&self) -> &'static str {
        match self {
            ObjectClass::Car => "Car",
            ObjectClass::Cyclist => "Cyclist",
            ObjectClass::Pedestrian => "Pedestrian",
        }
    }

    /// The canonical numeric id.
    pub fn id(&self) -> u8 {
        match self {
            ObjectClass::Car => 0,
            ObjectClass::Cyclist => 1,
            ObjectClass::Pedestrian => 2,
        }
    }
}

impl std::fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A 3D object annotation in camera coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// The object class.
    pub class: ObjectClass,
    /// Fraction of the object leaving the image, in [0, 1].
    pub truncation: f32,
    /// Occlusion level (0 fully visible .. 3 unknown).
    pub occlusion: f32,
    /// Observation angle in radians.
    pub alpha: f32,
    /// The labelled 2D box as (x_min, y_min, x_max, y_max) in raw image pixels.
    pub box2d: [f32; 4],
    /// Box dimensions as (length, height, width) in meters.
    pub dimensions: [f32; 3],
    /// Bottom-center of the box in camera coordinates (meters).
    pub location: [f32; 3],
    /// Rotation around the camera y axis in radians.
    pub rotation_y: f32,
}

#[cfg(test)]
mod tests {
    use super::ObjectClass;

    #[test]
    fn class_names_round_trip() {
        for class in ObjectClass::ALL {
            assert_eq!(ObjectClass::from_name(class.name()), Some(class));
        }
        assert_eq!(ObjectClass::from_name("DontCare"), None);
        assert_eq!(ObjectClass::from_name("car"), None);
        assert_eq!(ObjectClass::Pedestrian.id(), 2);
    }
}
