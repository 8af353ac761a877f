use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glint::{
    BoundingTree, Camera, CameraSettings, Color, Light, Material, Object, PointLight, Scene,
    Sphere, Transform,
};
use nalgebra::{Point3, Vector3};
use std::sync::Arc;

fn sphere_field(size: u32) -> Scene {
    let camera = Camera::from(CameraSettings {
        position: Point3::from([0.0, 3.0, 12.0]),
        target: Point3::origin(),
        width: size,
        height: size,
        max_bounces: 4,
        ..CameraSettings::default()
    });

    let mut scene = Scene::new(camera, Color::new(0.05, 0.05, 0.1));
    scene.add_light(Light::Point(Box::new(PointLight::new(
        Color::white(),
        Point3::from([0.0, 8.0, 5.0]),
    ))));

    for x in -2..=2 {
        for z in -2..=2 {
            let transform = Transform::identity().translate(Vector3::new(
                f64::from(x) * 2.0,
                0.0,
                f64::from(z) * 2.0,
            ));
            scene.add_object(Object::Sphere(Box::new(Sphere::new(
                0.8,
                transform,
                Arc::new(Material::default()),
            ))));
        }
    }

    scene
}

fn grid_mesh(quads_per_side: u32) -> (Vec<Point3<f64>>, Vec<[u32; 3]>) {
    let step = 2.0 / f64::from(quads_per_side);
    let verts_per_side = quads_per_side + 1;

    let mut positions = Vec::new();
    for y in 0..verts_per_side {
        for x in 0..verts_per_side {
            positions.push(Point3::new(
                -1.0 + f64::from(x) * step,
                -1.0 + f64::from(y) * step,
                0.0,
            ));
        }
    }

    let mut triangles = Vec::new();
    for y in 0..quads_per_side {
        for x in 0..quads_per_side {
            let v00 = y * verts_per_side + x;
            let v10 = v00 + 1;
            let v01 = v00 + verts_per_side;
            let v11 = v01 + 1;
            triangles.push([v00, v10, v01]);
            triangles.push([v10, v11, v01]);
        }
    }

    (positions, triangles)
}

pub fn render_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sphere field");
    for size in &[32u32, 64] {
        let mut scene = sphere_field(*size);
        group.bench_with_input(BenchmarkId::new("Render", size), size, |b, _| {
            b.iter(|| scene.render().unwrap());
        });
    }
    group.finish();
}

pub fn tree_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bounding tree");
    for quads in &[16u32, 64] {
        let (positions, triangles) = grid_mesh(*quads);
        let tree = BoundingTree::build(&positions, &triangles).unwrap();

        let origin = Point3::new(0.3, -0.2, 4.0);
        let direction = Vector3::new(-0.05, 0.08, -1.0).normalize();

        group.bench_with_input(BenchmarkId::new("Candidates", quads), quads, |b, _| {
            b.iter(|| tree.candidates(&origin, &direction));
        });
    }
    group.finish();
}

criterion_group!(benches, render_benchmark, tree_benchmark);
criterion_main!(benches);
