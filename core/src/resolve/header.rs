use crate::external::TemplateRegistry;
use crate::header::{DecodedHeader, HeaderCache, TimeUnit};
use crate::record::Acquisition;
use crate::resolve::direction::canonicalize_direction_code;
use crate::resolve::slice_order::{timings_for, SliceOrder};
use crate::resolve::{Loader, Resolver};
use crate::types::{AxisCode, DirectionCode, MetadataValue, TEMPLATES};
use parking_lot::Mutex;
use std::sync::Arc;

/// Fills metadata keys from the decoded image header
///
/// Every branch degrades header failures to "unavailable": the loader
/// answers or stays silent, it never raises.
pub struct HeaderLoader {
    headers: Arc<HeaderCache>,
    templates: Arc<dyn TemplateRegistry>,
}

impl HeaderLoader {
    pub(crate) fn new(headers: Arc<HeaderCache>, templates: Arc<dyn TemplateRegistry>) -> Self {
        Self { headers, templates }
    }

    /// Literal descriptor value, else the 4th grid spacing
    ///
    /// The spacing is normalized to seconds by the declared time unit; a
    /// missing or non-standard unit is assumed to mean seconds, with a
    /// caution logged.
    fn repetition_time(
        record: &Acquisition,
        entry: &Arc<Mutex<DecodedHeader>>,
    ) -> Option<MetadataValue> {
        let guard = entry.lock();

        if let Some(&repetition_time) = guard.descrip.get("repetition_time") {
            return Some(repetition_time.into());
        }

        let zooms = guard.header.zooms().ok()?;
        if zooms.len() != 4 {
            log::info!(
                "Missing repetition_time in image file header zooms {:?}",
                zooms
            );
            return None;
        }
        let mut repetition_time = zooms[3];

        match guard.header.time_units() {
            Ok(Some(TimeUnit::Milliseconds)) => repetition_time /= 1e3,
            Ok(Some(TimeUnit::Microseconds)) => repetition_time /= 1e6,
            Ok(Some(TimeUnit::Seconds)) => {}
            Ok(Some(TimeUnit::Unknown(unit))) => log::info!(
                "Unknown repetition_time units \"{}\" specified. Assuming {} seconds for \"{}\"",
                unit,
                repetition_time,
                record.path().display()
            ),
            Ok(None) | Err(_) => log::info!(
                "Missing units for repetition_time. Assuming {} seconds for \"{}\"",
                repetition_time,
                record.path().display()
            ),
        }

        Some(repetition_time.into())
    }

    /// Literal descriptor pass-through
    fn echo_time(entry: &Arc<Mutex<DecodedHeader>>) -> Option<MetadataValue> {
        let echo_time = *entry.lock().descrip.get("echo_time")?;
        Some(echo_time.into())
    }

    /// Declared slice-encoding axis, as an axis code
    fn slice_encoding_direction(entry: &Arc<Mutex<DecodedHeader>>) -> Option<MetadataValue> {
        let axis = entry.lock().header.slice_axis().ok()??;
        let code = AxisCode::from_parts(axis, false)?;
        Some(code.as_str().into())
    }

    /// First template whose registered origins come within RMS distance 1
    /// of the header's best-affine translation
    fn space(&self, entry: &Arc<Mutex<DecodedHeader>>) -> Option<MetadataValue> {
        let affine = entry.lock().header.best_affine().ok()?;
        let origin = affine.col(3).truncate();

        for template in TEMPLATES {
            for reference in self.templates.origins(template) {
                // Squared distances; orientation does not matter here
                let rms = ((reference - origin).length_squared() / 3.0).sqrt();
                if rms < 1.0 {
                    return Some((*template).into());
                }
            }
        }

        None
    }

    /// Per-slice acquisition offsets in seconds
    fn slice_timing(
        &self,
        resolver: &Resolver,
        record: &Acquisition,
        entry: &Arc<Mutex<DecodedHeader>>,
    ) -> Option<MetadataValue> {
        // 1. Slice axis and count; nothing works without them
        if !resolver.fill(record, "slice_encoding_direction") {
            return None;
        }
        let direction = record.metadata_str("slice_encoding_direction")?;
        let code = direction.parse::<DirectionCode>().ok()?;
        let axis_code = match code {
            DirectionCode::Axis(axis) => axis,
            space => {
                match canonicalize_direction_code(
                    space,
                    record.path(),
                    &self.headers,
                    resolver.database(),
                ) {
                    Ok(axis) => axis,
                    Err(e) => {
                        log::debug!(
                            "Cannot canonicalize slice_encoding_direction for \"{}\": {}",
                            record.path().display(),
                            e
                        );
                        return None;
                    }
                }
            }
        };
        let slice_axis = axis_code.axis();
        let n_slices = {
            let mut guard = entry.lock();
            guard.header.set_slice_axis(slice_axis).ok()?;
            let shape = guard.header.data_shape().ok()?;
            *shape.get(slice_axis)?
        };
        if n_slices == 0 {
            return None;
        }

        // 2. Repetition time, in milliseconds
        if !resolver.fill(record, "repetition_time") {
            log::info!(
                "Could not get repetition_time for \"{}\"",
                record.path().display()
            );
            return None;
        }
        let repetition_time_ms = record.metadata_f64("repetition_time")? * 1000.0;

        let slice_timing_code = record.metadata_str("slice_timing_code");

        let times_ms = {
            let mut guard = entry.lock();

            // 3. Self-heal an implausible stored slice duration
            let stored = guard.header.slice_duration().ok()?;
            let expected = repetition_time_ms / n_slices as f64;
            if stored > expected || stored * (n_slices as f64) < repetition_time_ms - 2.0 * expected
            {
                log::info!(
                    "Image file header entry slice_duration ({} ms) is inconsistent \
                     with repetition_time / n_slices ({} ms) for file \"{}\"",
                    stored,
                    expected,
                    record.path().display()
                );
                guard.header.set_slice_duration(expected).ok()?;
            }
            if stored.abs() < f64::EPSILON {
                guard.header.set_slice_duration(expected).ok()?;
            }
            let slice_duration = guard.header.slice_duration().ok()?;

            // 4. Expand a named order, else trust the stored times
            match &slice_timing_code {
                Some(name) => {
                    let order = SliceOrder::from_name(name)?;
                    timings_for(order, n_slices, slice_duration)
                }
                None => guard.header.slice_times().ok()?,
            }
        };

        // 5. Milliseconds to seconds
        let slice_times: Vec<f64> = times_ms.iter().map(|t| t / 1000.0).collect();

        // 6. An all-zero vector is indistinguishable from an unset header
        //    and stays unresolved
        if slice_times.iter().all(|t| t.abs() < 1e-10) {
            return None;
        }
        Some(slice_times.into())
    }
}

impl Loader for HeaderLoader {
    fn fill(&self, resolver: &Resolver, record: &Acquisition, key: &str) -> bool {
        let Some(entry) = self.headers.load(record.path()) else {
            return false;
        };

        let value = match key {
            "slice_timing" => self.slice_timing(resolver, record, &entry),
            "slice_encoding_direction" => Self::slice_encoding_direction(&entry),
            "repetition_time" => Self::repetition_time(record, &entry),
            "echo_time" => Self::echo_time(&entry),
            "space" => self.space(&entry),
            _ => None,
        };

        match value {
            Some(value) => {
                record.insert_metadata(key, value);
                true
            }
            None => false,
        }
    }
}
