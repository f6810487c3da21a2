// parallel.rs - Per-frame update of many animated instances

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use glam::Vec3;

use crate::model::AnimatedModel;

/// Advance every instance by `delta_time` seconds
///
/// Instances share only their immutable model, so with the `parallel`
/// feature each one runs on the rayon pool; otherwise they run in order.
pub fn update_all(instances: &mut [AnimatedModel], delta_time: f32) {
    #[cfg(feature = "parallel")]
    instances
        .par_iter_mut()
        .for_each(|instance| instance.update(delta_time));

    #[cfg(not(feature = "parallel"))]
    instances
        .iter_mut()
        .for_each(|instance| instance.update(delta_time));
}

/// Advance every instance and skin its positions into the matching buffer
///
/// `buffers` is resized to one buffer per instance and each keeps its
/// allocation between frames.
pub fn update_and_skin_all(
    instances: &mut [AnimatedModel],
    delta_time: f32,
    buffers: &mut Vec<Vec<Vec3>>,
) {
    buffers.resize_with(instances.len(), Vec::new);

    let step = |(instance, out): (&mut AnimatedModel, &mut Vec<Vec3>)| {
        instance.update(delta_time);
        instance.skin_positions_into(out);
    };

    #[cfg(feature = "parallel")]
    instances
        .par_iter_mut()
        .zip(buffers.par_iter_mut())
        .for_each(step);

    #[cfg(not(feature = "parallel"))]
    instances.iter_mut().zip(buffers.iter_mut()).for_each(step);
}
