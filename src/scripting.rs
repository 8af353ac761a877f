use crate::core::{Color, Transform};
use crate::error::Error;
use crate::render::Scene;
use nalgebra::{Point3, Vector3};
use rhai::{Engine, EvalAltResult, Scope, AST};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Shared handle through which the driver and the script alias one scene.
pub type SceneHandle = Rc<RefCell<Scene>>;

/// Animation collaborator: advances the scene to `elapsed` seconds of
/// scene time between render passes. Returning `true` stops the run.
pub trait Animator {
    fn tick(&mut self, elapsed: f64) -> Result<bool, Error>;
}

/// `Animator` backed by a [Rhai](https://rhai.rs) script. The script
/// defines `fn tick(t)` and drives the scene through the registered API.
pub struct ScriptAnimator {
    engine: Engine,
    ast: AST,
    scope: Scope<'static>,
}

impl ScriptAnimator {
    pub fn from_file(path: &Path, scene: &SceneHandle) -> Result<Self, Error> {
        let mut engine = Engine::new();
        register_api(&mut engine, scene);

        let ast = engine
            .compile_file(path.to_path_buf())
            .map_err(|err| Error::Script(format!("Rhai {}", err)))?;

        Ok(Self {
            engine,
            ast,
            scope: Scope::new(),
        })
    }

    pub fn from_source(source: &str, scene: &SceneHandle) -> Result<Self, Error> {
        let mut engine = Engine::new();
        register_api(&mut engine, scene);

        let ast = engine
            .compile(source)
            .map_err(|err| Error::Script(format!("Rhai {}", err)))?;

        Ok(Self {
            engine,
            ast,
            scope: Scope::new(),
        })
    }
}

impl Animator for ScriptAnimator {
    fn tick(&mut self, elapsed: f64) -> Result<bool, Error> {
        self.engine
            .call_fn::<bool>(&mut self.scope, &self.ast, "tick", (elapsed,))
            .map_err(|err| Error::Script(format!("Rhai {}", err)))
    }
}

fn checked_index(index: i64, count: usize) -> Result<usize, Box<EvalAltResult>> {
    if index < 0 {
        return Err(format!("negative index {}", index).into());
    }
    let index = index as usize;
    if index >= count {
        return Err(format!("index {} is out of bounds ({} entries)", index, count).into());
    }

    Ok(index)
}

fn register_api(engine: &mut Engine, scene: &SceneHandle) {
    engine.register_type_with_name::<Vector3<f64>>("Vec3");
    engine.register_type_with_name::<Transform>("Transform");

    engine.register_fn("vec3", |x: f64, y: f64, z: f64| Vector3::new(x, y, z));

    engine.register_fn("transform", Transform::identity);
    engine.register_fn("translate", |transform: Transform, x: f64, y: f64, z: f64| {
        transform.translate(Vector3::new(x, y, z))
    });
    engine.register_fn("rotate_x", |transform: Transform, degrees: f64| {
        transform.rotate(Vector3::x_axis(), degrees)
    });
    engine.register_fn("rotate_y", |transform: Transform, degrees: f64| {
        transform.rotate(Vector3::y_axis(), degrees)
    });
    engine.register_fn("rotate_z", |transform: Transform, degrees: f64| {
        transform.rotate(Vector3::z_axis(), degrees)
    });
    engine.register_fn("scale", |transform: Transform, x: f64, y: f64, z: f64| {
        transform.scale(Vector3::new(x, y, z))
    });

    let handle = Rc::clone(scene);
    engine.register_fn(
        "look_at",
        move |px: f64, py: f64, pz: f64, tx: f64, ty: f64, tz: f64, ux: f64, uy: f64, uz: f64| {
            handle.borrow_mut().camera_mut().look_at(
                Point3::new(px, py, pz),
                Point3::new(tx, ty, tz),
                Vector3::new(ux, uy, uz),
            );
        },
    );

    let handle = Rc::clone(scene);
    engine.register_fn("set_fov", move |degrees: f64| {
        handle.borrow_mut().camera_mut().set_fov(degrees);
    });

    let handle = Rc::clone(scene);
    engine.register_fn("set_aperture", move |aperture: f64| {
        handle.borrow_mut().camera_mut().set_aperture(aperture);
    });

    let handle = Rc::clone(scene);
    engine.register_fn("set_background", move |r: f64, g: f64, b: f64| {
        handle.borrow_mut().set_background(Color::new(r, g, b));
    });

    let handle = Rc::clone(scene);
    engine.register_fn("object_count", move || {
        handle.borrow().object_count() as i64
    });

    let handle = Rc::clone(scene);
    engine.register_fn("light_count", move || handle.borrow().light_count() as i64);

    let handle = Rc::clone(scene);
    engine.register_fn(
        "set_object_transform",
        move |index: i64, transform: Transform| -> Result<(), Box<EvalAltResult>> {
            let mut scene = handle.borrow_mut();
            let index = checked_index(index, scene.object_count())?;
            *scene.object_mut(index).unwrap().transform_mut() = transform;

            Ok(())
        },
    );

    let handle = Rc::clone(scene);
    engine.register_fn(
        "remove_object",
        move |index: i64| -> Result<(), Box<EvalAltResult>> {
            let mut scene = handle.borrow_mut();
            let index = checked_index(index, scene.object_count())?;
            scene.remove_object(index);

            Ok(())
        },
    );

    let handle = Rc::clone(scene);
    engine.register_fn(
        "set_light_on",
        move |index: i64, on: bool| -> Result<(), Box<EvalAltResult>> {
            let mut scene = handle.borrow_mut();
            let index = checked_index(index, scene.light_count())?;
            scene.light_mut(index).unwrap().set_on(on);

            Ok(())
        },
    );
}
