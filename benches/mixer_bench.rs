use std::f32::consts::TAU;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use diorama::animation::{
    AnimationClip, AnimationMixer, Interpolation, Track, TrackValues,
};
use diorama::scene::{Node, NodeId, SceneGraph};
use glam::{Quat, Vec3};

const KEYS: usize = 60;

fn spinning_clip(targets: usize) -> AnimationClip {
    let times: Vec<f32> = (0..KEYS).map(|i| i as f32 / 30.0).collect();
    let tracks = (0..targets)
        .flat_map(|target| {
            let rotations = times
                .iter()
                .map(|t| Quat::from_rotation_y(t * TAU))
                .collect();
            let translations =
                times.iter().map(|t| Vec3::new(0.0, t.sin(), 0.0)).collect();
            [
                Track {
                    target,
                    times: times.clone(),
                    values: TrackValues::Rotation(rotations),
                    interpolation: Interpolation::Linear,
                },
                Track {
                    target,
                    times: times.clone(),
                    values: TrackValues::Translation(translations),
                    interpolation: Interpolation::Linear,
                },
            ]
        })
        .collect();
    AnimationClip::new("spin", tracks)
}

fn scene_with(count: usize) -> (SceneGraph, Vec<NodeId>) {
    let mut scene = SceneGraph::new();
    let root = scene.root();
    let nodes = (0..count)
        .filter_map(|i| scene.add(root, Node::new(format!("n{i}"))))
        .collect();
    (scene, nodes)
}

fn track_sample_benchmark(c: &mut Criterion) {
    let clip = spinning_clip(1);
    let track = &clip.tracks[0];
    c.bench_function("track_sample_rotation", |b| {
        b.iter(|| black_box(track.sample(black_box(0.77))));
    });
}

fn mixer_update_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixer_update");

    for count in [10, 100, 500] {
        let (mut scene, nodes) = scene_with(count);
        let mut mixer = AnimationMixer::new(vec![spinning_clip(count)], nodes);
        if let Some(action) = mixer.clip_action(0) {
            let _ = action.play();
        }

        group.bench_function(format!("{count}_nodes"), |b| {
            b.iter(|| mixer.update(black_box(1.0 / 60.0), &mut scene));
        });
    }
    group.finish();
}

criterion_group!(benches, track_sample_benchmark, mixer_update_benchmark);
criterion_main!(benches);
