//! Shared fixtures for the integration tests
#![allow(dead_code)]

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use anim_bake::{
    AnimationClip, BoneId, BoneTracks, Interpolation, KeyframeTrack, KeyframedClip, MaterialId,
    Rig, RigBone, SourceMesh, SubMesh, Topology,
};
use glam::{Mat4, Quat, Vec2, Vec3};

pub const SHOULDER: BoneId = BoneId::new(100);
pub const ELBOW: BoneId = BoneId::new(200);
pub const WRIST: BoneId = BoneId::new(300);

/// Route the crate's log output to the test harness; `RUST_LOG` picks the level
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Three-bone arm; the elbow rests slightly bent
pub fn arm_rig() -> Arc<Rig> {
    init_logging();
    let bones = vec![
        RigBone::new(SHOULDER, "shoulder"),
        RigBone::new(ELBOW, "elbow")
            .with_parent(0)
            .with_translation(Vec3::Y)
            .with_rotation(Quat::from_rotation_x(0.3)),
        RigBone::new(WRIST, "wrist")
            .with_parent(1)
            .with_translation(Vec3::Y),
    ];
    match Rig::new(Mat4::IDENTITY, bones) {
        Ok(rig) => Arc::new(rig),
        Err(err) => panic!("fixture rig is invalid: {err}"),
    }
}

/// A quad strip skinned to `bones`, one vertex pair per bone
pub fn strip_mesh(rig: &Rig, name: &str, bones: &[BoneId]) -> SourceMesh {
    let mut mesh = SourceMesh::new(name);
    mesh.bones = rig.bindings_for(bones).unwrap();

    let model = rig.rest_model_transforms();
    for (local, bone) in bones.iter().enumerate() {
        let index = rig.index_of(*bone).unwrap();
        let origin = model[index].w_axis.truncate();
        for side in [-0.25, 0.25] {
            mesh.positions.push(origin + Vec3::new(side, 0.1, 0.0));
            mesh.normals.push(Vec3::Z);
            mesh.uvs[0].push(Vec2::new(side + 0.5, local as f32));
            mesh.bone_indices.push(local as u32);
        }
    }

    let pairs = bones.len() as u32;
    let indices = (0..pairs.saturating_sub(1))
        .flat_map(|pair| {
            let base = pair * 2;
            [base, base + 1, base + 2, base + 2, base + 1, base + 3]
        })
        .collect();
    mesh.submeshes = vec![SubMesh::new(Topology::Triangles, indices)];
    mesh.materials = vec![MaterialId(7)];
    mesh
}

/// Bends the shoulder by a quarter turn over `duration`, starting at rest
pub fn wave_clip(rig: &Arc<Rig>, name: &str, duration: f32, rate: f32) -> AnimationClip {
    let rotation = KeyframeTrack::new(
        Interpolation::Linear,
        vec![0.0, duration],
        vec![Quat::IDENTITY, Quat::from_rotation_z(FRAC_PI_2)],
    );
    let tracks = BoneTracks {
        rotation: rotation.ok(),
        ..Default::default()
    };
    match KeyframedClip::new(rig.clone()).with_tracks(SHOULDER, tracks) {
        Ok(clip) => clip.into_animation(name, duration, rate),
        Err(err) => panic!("fixture clip is invalid: {err}"),
    }
}

/// Holds the rest pose
pub fn rest_clip(rig: &Arc<Rig>, name: &str, duration: f32, rate: f32) -> AnimationClip {
    KeyframedClip::new(rig.clone()).into_animation(name, duration, rate)
}
