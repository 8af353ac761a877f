use super::{Camera, RenderOptions, SamplingMode, BIAS};
use crate::core::Color;
use crate::error::Error;
use crate::lights::Light;
use crate::primitives::Object;
use crate::ray_intersection::{Intersection, Ray};
use crate::utils;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use nalgebra::Vector3;
use rand::Rng;
use rayon::prelude::*;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

/// Everything a render pass reads: camera, lights, objects, background
/// and sampling options. Populated from a scene file or programmatically;
/// mutable between passes (the animation script edits it), read-only while
/// one is running.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Scene {
    background: Color,
    output: String,
    camera: Camera,
    lights: Vec<Light>,
    objects: Vec<Object>,
    #[serde(flatten)]
    options: RenderOptions,

    #[serde(skip)]
    loaded: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            background: Color::black(),
            output: String::from("out.png"),
            camera: Camera::default(),
            lights: Vec::new(),
            objects: Vec::new(),
            options: RenderOptions::default(),
            loaded: false,
        }
    }
}

// State carried through one primary ray's recursion. Owning it per ray
// keeps the integrator free of thread-local storage.
struct TraceContext<'a, R: Rng> {
    rng: &'a mut R,
    inside: bool,
}

impl Scene {
    pub fn new(camera: Camera, background: Color) -> Self {
        Self {
            background,
            camera,
            ..Scene::default()
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let file = File::open(path).map_err(|source| Error::SceneIo {
            path: path.to_path_buf(),
            source,
        })?;
        let scene = serde_json::from_reader(file)?;

        Ok(scene)
    }

    /// Load meshes and textures for every object. Loading twice would
    /// duplicate mesh buffers, so repeat calls are ignored.
    pub fn load_assets(&mut self, asset_base: &Path) {
        if self.loaded {
            return;
        }

        for object in &mut self.objects {
            object.load_assets(asset_base);
        }
        self.loaded = true;
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, background: Color) {
        self.background = background;
    }

    pub fn output_file(&self) -> &str {
        &self.output
    }

    pub fn set_output_file(&mut self, output: &str) {
        self.output = output.to_string();
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn set_supersampling(&mut self, mode: SamplingMode, subdivisions: u32) {
        self.options.supersampling.mode = mode;
        self.options.supersampling.subdivisions = subdivisions;
    }

    pub fn set_dof_rays(&mut self, rays: u32) {
        self.options.dof_rays = rays;
    }

    pub fn add_object(&mut self, object: Object) {
        self.objects.push(object);
    }

    pub fn remove_object(&mut self, index: usize) -> Option<Object> {
        if index < self.objects.len() {
            Some(self.objects.remove(index))
        } else {
            None
        }
    }

    pub fn object_mut(&mut self, index: usize) -> Option<&mut Object> {
        self.objects.get_mut(index)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn remove_light(&mut self, index: usize) -> Option<Light> {
        if index < self.lights.len() {
            Some(self.lights.remove(index))
        } else {
            None
        }
    }

    pub fn light_mut(&mut self, index: usize) -> Option<&mut Light> {
        self.lights.get_mut(index)
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    /// Recompute the cached inverse of every object transform that changed.
    /// Runs single-threaded before workers are dispatched; nothing touches
    /// the caches after this during a pass.
    pub fn commit_transforms(&mut self) -> Result<(), Error> {
        for object in &mut self.objects {
            object.transform_mut().commit()?;
        }

        Ok(())
    }

    /// Nearest intersection along the ray over all objects. Per-mesh
    /// bounding trees prune inside `Object::intersect`; the object list
    /// itself is scanned linearly.
    fn find_intersection(&self, ray: &Ray) -> Option<(&Object, Intersection)> {
        let mut nearest: Option<(f64, &Object, Intersection)> = None;
        for object in &self.objects {
            if let Some(intersection) = object.intersect(ray) {
                let distance = (ray.origin - intersection.position).magnitude_squared();
                if nearest.as_ref().map_or(true, |(d, _, _)| distance < *d) {
                    nearest = Some((distance, object, intersection));
                }
            }
        }

        nearest.map(|(_, object, intersection)| (object, intersection))
    }

    fn trace_ray<R: Rng>(&self, ray: &Ray, bounces: u32, ctx: &mut TraceContext<R>) -> Color {
        let (object, intersection) = match self.find_intersection(ray) {
            Some(hit) => hit,
            None => return self.background,
        };

        let material = object.material();
        let hit_from_behind = intersection.normal.dot(&ray.direction) > 0.0;
        let surface_normal = if hit_from_behind {
            -intersection.normal.into_inner()
        } else {
            intersection.normal.into_inner()
        };

        let mut color = Color::black();
        for light in &self.lights {
            if !light.is_on() {
                continue;
            }

            if light.is_directional() {
                let (light_dir, light_distance) =
                    light.direction_and_distance(&intersection.position);
                let shadow_ray = Ray::new(intersection.position + surface_normal * BIAS, light_dir);
                if let Some((_, blocker)) = self.find_intersection(&shadow_ray) {
                    let blocker_distance = (blocker.position - intersection.position).magnitude();
                    if light_distance > blocker_distance {
                        continue;
                    }
                }
            } else if ctx.inside {
                // No ambient term while travelling inside a refractive
                // medium.
                continue;
            }

            color += light.shade(&intersection, &ray.origin, material);
        }

        color *= 1.0 - material.reflectance() - material.transmittance();

        if bounces == 0 {
            return color;
        }

        if material.reflectance() > 0.0 {
            let mut reflected = ray.reflect(intersection.position, surface_normal, BIAS);
            reflected.direction = reflected.direction.normalize();
            color += self.trace_ray(&reflected, bounces - 1, ctx) * material.reflectance();
        }

        if material.transmittance() > 0.0 {
            let (mut refracted, refraction) = ray.refract(
                intersection.position,
                intersection.normal.into_inner(),
                1.0,
                material.refraction(),
                BIAS,
            );
            refracted.direction = refracted.direction.normalize();

            // Crossing the surface flips which medium the ray is in; total
            // internal reflection keeps it on the same side.
            if refraction.refracted {
                ctx.inside = !ctx.inside;
            }
            color += self.trace_ray(&refracted, bounces - 1, ctx) * material.transmittance();
            if refraction.refracted {
                ctx.inside = !ctx.inside;
            }
        }

        color
    }

    fn trace_primary<R: Rng>(&self, direction: Vector3<f64>, rng: &mut R) -> Color {
        let ray = Ray::new(self.camera.position(), self.camera.to_world(&direction));
        let mut ctx = TraceContext {
            rng: &mut *rng,
            inside: false,
        };

        self.trace_ray(&ray, self.camera.max_bounces(), &mut ctx)
    }

    /// Lens sampling: extra rays leave from random points on the aperture
    /// disk, all aimed at the focal point of the pinhole direction, and
    /// average together with the central ray.
    fn trace_with_lens<R: Rng>(&self, direction: Vector3<f64>, rng: &mut R) -> Color {
        // A closed aperture collapses every lens sample onto the central
        // ray; skip straight to it.
        if self.camera.aperture() == 0.0 {
            return self.trace_primary(direction, rng);
        }

        let mut color = Color::black();
        let focal_point = direction * self.camera.focal_length();

        for _ in 0..self.options.dof_rays {
            let lens = utils::sample_in_disk(rng, self.camera.aperture());
            let lens = Vector3::new(lens.x, lens.y, 0.0);
            let through_focus = (focal_point - lens).normalize();

            let ray = Ray::new(
                self.camera.position() + self.camera.to_world(&lens),
                self.camera.to_world(&through_focus),
            );
            let mut ctx = TraceContext {
                rng: &mut *rng,
                inside: false,
            };
            color += self.trace_ray(&ray, self.camera.max_bounces(), &mut ctx);
        }

        color += self.trace_primary(direction, rng);

        color / f64::from(self.options.dof_rays + 1)
    }

    fn sample<R: Rng>(&self, xf: f64, yf: f64, rng: &mut R) -> Color {
        let direction = Vector3::new(xf, yf, -1.0).normalize();

        if self.options.dof_rays > 0 {
            self.trace_with_lens(direction, rng)
        } else {
            self.trace_primary(direction, rng)
        }
    }

    fn supersample_grid<R: Rng>(
        &self,
        xf: f64,
        yf: f64,
        dx: f64,
        dy: f64,
        sub: u32,
        rng: &mut R,
    ) -> Color {
        let mut color = Color::black();
        let (step_x, step_y) = (dx / f64::from(sub), dy / f64::from(sub));

        let mut sub_xf = xf - dx / 2.0 + step_x / 2.0;
        for _ in 0..sub {
            let mut sub_yf = yf - dy / 2.0 + step_y / 2.0;
            for _ in 0..sub {
                color += self.sample(sub_xf, sub_yf, rng);
                sub_yf += step_y;
            }
            sub_xf += step_x;
        }

        color / f64::from(sub * sub)
    }

    fn supersample_jitter<R: Rng>(
        &self,
        xf: f64,
        yf: f64,
        dx: f64,
        dy: f64,
        sub: u32,
        rng: &mut R,
    ) -> Color {
        let mut color = Color::black();
        let (step_x, step_y) = (dx / f64::from(sub), dy / f64::from(sub));

        let mut sub_xf = xf - dx / 2.0;
        for _ in 0..sub {
            let mut sub_yf = yf - dy / 2.0;
            for _ in 0..sub {
                let sample_x = rng.gen::<f64>() * step_x + sub_xf;
                let sample_y = rng.gen::<f64>() * step_y + sub_yf;
                color += self.sample(sample_x, sample_y, rng);
                sub_yf += step_y;
            }
            sub_xf += step_x;
        }

        color / f64::from(sub * sub)
    }

    fn pixel_color<R: Rng>(&self, xf: f64, yf: f64, dx: f64, dy: f64, rng: &mut R) -> Color {
        let sub = self.options.supersampling.subdivisions;
        match self.options.supersampling.mode {
            // A 1x1 grid is the pixel center again.
            SamplingMode::Grid if sub > 1 => self.supersample_grid(xf, yf, dx, dy, sub, rng),
            SamplingMode::Jitter if sub > 0 => self.supersample_jitter(xf, yf, dx, dy, sub, rng),
            _ => self.sample(xf, yf, rng),
        }
    }

    // Half-extents of the image plane at unit distance and the sub-pixel
    // steps across it.
    fn image_plane(&self) -> (f64, f64, f64, f64) {
        let (width, height) = (
            f64::from(self.camera.width()),
            f64::from(self.camera.height()),
        );
        let ratio = width / height;
        let xm = self.camera.fov().tan();
        let ym = (self.camera.fov() / ratio).tan();

        (xm, ym, 2.0 * xm / width, 2.0 * ym / height)
    }

    fn trace_column<R: Rng>(&self, xf: f64, ym: f64, dx: f64, dy: f64, rng: &mut R) -> Vec<Color> {
        let height = self.camera.height();
        let mut column = vec![Color::black(); height as usize];

        for y in 0..height {
            let yf = (2.0 * f64::from(y) / f64::from(height) - 1.0) * ym;
            // Image rows run top to bottom; the plane's y axis runs up.
            column[(height - y - 1) as usize] = self.pixel_color(xf, yf, dx, dy, rng);
        }

        column
    }

    /// Render single-threaded. Returns the image as columns, left to right.
    pub fn render(&mut self) -> Result<Vec<Vec<Color>>, Error> {
        self.commit_transforms()?;
        let (xm, ym, dx, dy) = self.image_plane();
        let width = self.camera.width();
        let mut rng = rand::thread_rng();

        Ok((0..width)
            .map(|x| {
                let xf = (2.0 * f64::from(x) / f64::from(width) - 1.0) * xm;
                self.trace_column(xf, ym, dx, dy, &mut rng)
            })
            .collect())
    }

    /// Render with one rayon task per column. Columns share nothing but the
    /// scene itself, which stays immutable after the transform commit; the
    /// collect preserves column order.
    pub fn render_parallel(&mut self, use_progress: bool) -> Result<Vec<Vec<Color>>, Error> {
        self.commit_transforms()?;
        let (xm, ym, dx, dy) = self.image_plane();
        let width = self.camera.width();
        let scene: &Scene = self;

        let trace = |x: u32| {
            let xf = (2.0 * f64::from(x) / f64::from(width) - 1.0) * xm;
            scene.trace_column(xf, ym, dx, dy, &mut rand::thread_rng())
        };

        let columns = if use_progress {
            let progress = ProgressBar::new(width.into());
            progress.set_draw_delta(u64::from(width / 100 + 1));
            progress.set_style(ProgressStyle::default_bar().template(
                "[{elapsed_precise} elapsed] [{eta_precise} left] {bar:40} {pos}/{len} columns",
            ));

            (0..width)
                .into_par_iter()
                .progress_with(progress)
                .map(trace)
                .collect()
        } else {
            (0..width).into_par_iter().map(trace).collect()
        };

        Ok(columns)
    }
}
