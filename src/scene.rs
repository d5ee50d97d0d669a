use std::collections::BTreeMap;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::adapter::{JsonSceneAdapter, SceneAdapter};
use crate::classify::Role;
use crate::geometry::Geometry3D;
use crate::material::Material;
use crate::options::{CameraMode, ConvertOptions};
use crate::types::{Aabb, Color, Vec3};

const PADDING_FRACTION: f32 = 0.05;
const MIN_PADDING: f32 = 0.01;
const ORTHO_DISTANCE: f32 = 2.0;
const ORTHO_SCALE: f32 = 1.15;
const FRAMING_MARGIN: f32 = 1.3;
const ELEVATION_DEG: f32 = 30.0;
const CINEMATIC_AZIMUTH_DEG: f32 = 35.0;
const PERSPECTIVE_FOV_DEG: f32 = 50.0;
const CINEMATIC_FOV_DEG: f32 = 35.0;
const SENSOR_WIDTH_MM: f32 = 36.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneObject {
    pub name: String,
    pub role: Role,
    /// Index into `SceneDescription::materials`.
    pub material: usize,
    pub geometry: Geometry3D,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Projection {
    Orthographic { scale: f32 },
    Perspective { fov_deg: f32, lens_mm: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Camera {
    /// Resolved mode; never `Auto`.
    pub mode: CameraMode,
    pub position: Vec3,
    pub target: Vec3,
    pub projection: Projection,
    pub clip_start: f32,
    pub clip_end: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LightKind {
    Area { size: f32 },
    Ambient,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Light {
    pub name: String,
    pub kind: LightKind,
    pub position: Vec3,
    pub energy: f32,
    pub color: Color,
}

/// Engine-neutral scene handed to a renderer through a `SceneAdapter`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneDescription {
    pub bounds: Aabb,
    pub camera: Camera,
    pub lights: Vec<Light>,
    pub objects: Vec<SceneObject>,
    pub materials: Vec<Material>,
    pub groups: BTreeMap<Role, Vec<usize>>,
}

impl SceneDescription {
    /// Hex SHA-256 of the JSON adapter output. Equal scenes hash equal.
    pub fn fingerprint(&self) -> String {
        let json = JsonSceneAdapter::compact().adapt(self).unwrap_or_default();
        hex_sha256(json.as_bytes())
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

fn hex_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        use std::fmt::Write;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Padded union of every object's bounds; a unit box at the origin when empty.
pub fn scene_bounds(objects: &[SceneObject]) -> Aabb {
    let raw = objects
        .iter()
        .fold(Aabb::empty(), |acc, o| acc.union(&o.geometry.bounds()));
    if raw.is_empty() {
        return Aabb {
            min: Vec3::new(-0.5, -0.5, -0.5),
            max: Vec3::new(0.5, 0.5, 0.5),
        };
    }
    let margin = (raw.max_dimension() * PADDING_FRACTION).max(MIN_PADDING);
    raw.padded(margin)
}

/// Frames, lights and groups a finished object set.
pub fn compose(
    objects: Vec<SceneObject>,
    materials: Vec<Material>,
    options: &ConvertOptions,
) -> SceneDescription {
    let bounds = scene_bounds(&objects);
    let camera = frame_camera(&bounds, options.camera_mode.resolve(options.style_preset));
    let lights = light_rig(&bounds);

    let mut groups: BTreeMap<Role, Vec<usize>> = BTreeMap::new();
    for (idx, object) in objects.iter().enumerate() {
        groups.entry(object.role).or_default().push(idx);
    }

    SceneDescription {
        bounds,
        camera,
        lights,
        objects,
        materials,
        groups,
    }
}

pub fn frame_camera(bounds: &Aabb, mode: CameraMode) -> Camera {
    let center = bounds.center();
    let max_dim = bounds.max_dimension().max(MIN_PADDING);

    let (fov_deg, azimuth_deg) = match mode {
        CameraMode::Orthographic | CameraMode::Auto => {
            let distance = max_dim * ORTHO_DISTANCE;
            return Camera {
                mode: CameraMode::Orthographic,
                position: center.add(Vec3::new(0.0, 0.0, distance)),
                target: center,
                projection: Projection::Orthographic {
                    scale: max_dim * ORTHO_SCALE,
                },
                clip_start: distance * 0.01,
                clip_end: distance + max_dim * 4.0,
            };
        }
        CameraMode::Perspective => (PERSPECTIVE_FOV_DEG, 0.0),
        CameraMode::Cinematic => (CINEMATIC_FOV_DEG, CINEMATIC_AZIMUTH_DEG),
    };

    let half_fov = (fov_deg / 2.0).to_radians();
    let distance = (max_dim / 2.0) / libm::tanf(half_fov) * FRAMING_MARGIN;
    // Elevation tilts the view away from straight-on (+Z) toward -Y; azimuth turns it
    // about Z.
    let el = ELEVATION_DEG.to_radians();
    let az = azimuth_deg.to_radians();
    let direction = Vec3::new(
        libm::sinf(az) * libm::sinf(el),
        -libm::cosf(az) * libm::sinf(el),
        libm::cosf(el),
    );
    let lens_mm = SENSOR_WIDTH_MM / (2.0 * libm::tanf(half_fov));

    Camera {
        mode,
        position: center.add(direction.scale(distance)),
        target: center,
        projection: Projection::Perspective { fov_deg, lens_mm },
        clip_start: distance * 0.01,
        clip_end: distance + max_dim * 4.0,
    }
}

/// Key/fill/rim area lights plus ambient. Positions and sizes scale with the
/// scene; area energy scales with its square so brightness is size-independent.
pub fn light_rig(bounds: &Aabb) -> Vec<Light> {
    let center = bounds.center();
    let m = bounds.max_dimension().max(MIN_PADDING);
    let area = |name: &str, offset: Vec3, size: f32, energy: f32, color: Color| Light {
        name: name.to_string(),
        kind: LightKind::Area { size: size * m },
        position: center.add(offset.scale(m)),
        energy: energy * m * m,
        color,
    };
    vec![
        area(
            "key",
            Vec3::new(1.0, -1.0, 1.5),
            0.5,
            1000.0,
            Color::rgb(1.0, 0.97, 0.92),
        ),
        area(
            "fill",
            Vec3::new(-1.2, -0.6, 1.0),
            0.8,
            400.0,
            Color::rgb(0.92, 0.95, 1.0),
        ),
        area("rim", Vec3::new(0.0, 1.5, 0.8), 0.4, 600.0, Color::WHITE),
        Light {
            name: "ambient".to_string(),
            kind: LightKind::Ambient,
            position: center,
            energy: 0.3,
            color: Color::WHITE,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Bevel, FillMode, Shape3D};

    fn square(name: &str, role: Role, min: f32, max: f32) -> SceneObject {
        SceneObject {
            name: name.to_string(),
            role,
            material: 0,
            geometry: Geometry3D {
                shape: Shape3D::Extrusion {
                    outline: vec![
                        Vec3::new(min, min, 0.0),
                        Vec3::new(max, min, 0.0),
                        Vec3::new(max, max, 0.0),
                        Vec3::new(min, max, 0.0),
                    ],
                },
                depth: 0.1,
                bevel: Bevel {
                    width: 0.0,
                    segments: 1,
                    profile: 0.5,
                },
                fill_mode: FillMode::Closed,
                skipped_segments: 0,
            },
        }
    }

    #[test]
    fn empty_scene_gets_unit_box() {
        let scene = compose(Vec::new(), Vec::new(), &ConvertOptions::default());
        assert_eq!(scene.bounds.size(), Vec3::new(1.0, 1.0, 1.0));
        assert!(scene.groups.is_empty());
    }

    #[test]
    fn bounds_are_padded_by_five_percent() {
        let bounds = scene_bounds(&[square("a", Role::PrimaryNode, -1.0, 1.0)]);
        // Raw max dimension 2.0 -> margin 0.1 on every side.
        assert!((bounds.max.x - 1.1).abs() < 1e-6);
        assert!((bounds.min.z + 0.2).abs() < 1e-6);
    }

    #[test]
    fn tiny_scenes_use_minimum_padding() {
        let bounds = scene_bounds(&[square("a", Role::PrimaryNode, 0.0, 0.001)]);
        assert!((bounds.min.x + 0.01).abs() < 1e-6);
    }

    #[test]
    fn orthographic_camera_sits_above_center() {
        let bounds = Aabb::from_points([Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0)]);
        let cam = frame_camera(&bounds, CameraMode::Orthographic);
        assert_eq!(cam.position, Vec3::new(0.0, 0.0, 4.0));
        match cam.projection {
            Projection::Orthographic { scale } => assert!((scale - 2.3).abs() < 1e-5),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn perspective_camera_keeps_bounds_in_frustum() {
        let bounds = Aabb::from_points([Vec3::new(-2.0, -1.0, -0.1), Vec3::new(2.0, 1.0, 0.1)]);
        let cam = frame_camera(&bounds, CameraMode::Perspective);
        let distance = cam.position.sub(cam.target).length();
        let half_fov = (PERSPECTIVE_FOV_DEG / 2.0).to_radians();
        let visible_half_width = distance * libm::tanf(half_fov);
        assert!(visible_half_width >= bounds.max_dimension() / 2.0);
        // 30 degree tilt from straight-on.
        let dir = cam.position.sub(cam.target).normalized();
        assert!((dir.z - libm::cosf(30f32.to_radians())).abs() < 1e-5);
    }

    #[test]
    fn cinematic_camera_adds_azimuth_and_longer_lens() {
        let bounds = Aabb::from_points([Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0)]);
        let persp = frame_camera(&bounds, CameraMode::Perspective);
        let cine = frame_camera(&bounds, CameraMode::Cinematic);
        assert!(persp.position.x.abs() < 1e-6);
        assert!(cine.position.x > 0.0);
        let lens = |c: &Camera| match c.projection {
            Projection::Perspective { lens_mm, .. } => lens_mm,
            Projection::Orthographic { .. } => 0.0,
        };
        assert!(lens(&cine) > lens(&persp));
    }

    #[test]
    fn light_energy_scales_with_square_of_size() {
        let small = light_rig(&Aabb::from_points([Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0)]));
        let large = light_rig(&Aabb::from_points([Vec3::ZERO, Vec3::new(10.0, 10.0, 0.0)]));
        assert_eq!(small.len(), 4);
        assert!((large[0].energy / small[0].energy - 100.0).abs() < 1e-3);
        assert_eq!(large[3].energy, small[3].energy);
    }

    #[test]
    fn groups_map_roles_to_object_indices() {
        let scene = compose(
            vec![
                square("a", Role::PrimaryNode, 0.0, 1.0),
                square("b", Role::Connector, 0.0, 1.0),
                square("c", Role::PrimaryNode, 2.0, 3.0),
            ],
            Vec::new(),
            &ConvertOptions::default(),
        );
        assert_eq!(scene.groups[&Role::PrimaryNode], vec![0, 2]);
        assert_eq!(scene.groups[&Role::Connector], vec![1]);
        assert_eq!(scene.camera.mode, CameraMode::Orthographic);
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let scene = compose(
            vec![square("a", Role::PrimaryNode, 0.0, 1.0)],
            Vec::new(),
            &ConvertOptions::default(),
        );
        let fp = scene.fingerprint();
        assert_eq!(fp.len(), 64);
        assert_eq!(fp, scene.clone().fingerprint());
        let moved = compose(
            vec![square("a", Role::PrimaryNode, 0.0, 2.0)],
            Vec::new(),
            &ConvertOptions::default(),
        );
        assert_ne!(fp, moved.fingerprint());
    }
}
