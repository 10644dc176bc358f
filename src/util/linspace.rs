use crate::error::{Error, Result};

/// Linear subdivision of `[min, max]` into `count` ascending samples.
///
/// Endpoints are reproduced exactly: the last sample is `max` itself rather
/// than `min + (count - 1) * step`, which can drift by an ulp.
pub fn linear_samples(name: &'static str, min: f64, max: f64, count: usize) -> Result<Vec<f64>> {
    if !(min < max) {
        return Err(Error::InvalidRange { name, min, max });
    }
    if count < 2 {
        return Err(Error::InvalidSampleCount { name, count });
    }
    let step = (max - min) / (count - 1) as f64;
    let mut samples: Vec<f64> = (0..count).map(|i| min + step * i as f64).collect();
    samples[count - 1] = max;
    Ok(samples)
}

