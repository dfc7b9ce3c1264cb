use std::fmt;

use chrono::Utc;

/// Accuracy is stored as integer basis points (1/100 of a percent) so that
/// names compare exactly and never depend on float formatting or locale.
pub const BASIS_POINTS_SCALE: f64 = 10_000.0;

const EXTENSION: &str = ".bin";

/// Converts an accuracy in `[0, 1]` to basis points, clamping out-of-range
/// values and mapping NaN to 0.
pub fn basis_points(accuracy: f64) -> u32 {
    if !accuracy.is_finite() {
        return 0;
    }
    (accuracy * BASIS_POINTS_SCALE).round().clamp(0.0, BASIS_POINTS_SCALE) as u32
}

/// Everything a checkpoint file name records:
/// `L-{signature}-E-{epoch}-A-{basis points}-T-{timestamp}[-{n}].bin`.
///
/// The accuracy of a checkpoint can be recovered from its name alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointName {
    pub signature: String,
    pub epoch: usize,
    pub basis_points: u32,
    pub timestamp: String,
    /// Disambiguates two saves that land on the same timestamp.
    pub collision: Option<u32>,
}

impl CheckpointName {
    /// A name stamped with the current UTC time (nanosecond resolution).
    pub fn now(signature: &str, epoch: usize, accuracy: f64) -> CheckpointName {
        CheckpointName {
            signature: signature.to_owned(),
            epoch,
            basis_points: basis_points(accuracy),
            timestamp: Utc::now().format("%Y%m%dT%H%M%S%9f").to_string(),
            collision: None,
        }
    }

    pub fn accuracy(&self) -> f64 {
        f64::from(self.basis_points) / BASIS_POINTS_SCALE
    }

    /// The same name with the next collision counter.
    pub fn bump(&self) -> CheckpointName {
        CheckpointName {
            collision: Some(self.collision.map_or(1, |n| n + 1)),
            ..self.clone()
        }
    }

    /// Checks that `signature` yields a plain file name that `parse` reads
    /// back to the same signature.
    pub fn check_signature(signature: &str) -> Result<(), &'static str> {
        if signature.is_empty() {
            return Err("empty");
        }
        if signature.chars().any(|c| c == '/' || c == '\\') {
            return Err("contains a path separator");
        }
        if signature.chars().any(char::is_control) {
            return Err("contains a control character");
        }
        let name = CheckpointName {
            signature: signature.to_owned(),
            epoch: 0,
            basis_points: 0,
            timestamp: "0".to_owned(),
            collision: None,
        };
        match CheckpointName::parse(&name.to_string()) {
            Some(parsed) if parsed.signature == signature => Ok(()),
            _ => Err("does not survive a file name round trip"),
        }
    }

    /// Parses a file name produced by `Display`. Returns `None` for anything
    /// else, so foreign `.bin` files in the directory are ignored.
    pub fn parse(file_name: &str) -> Option<CheckpointName> {
        let stem = file_name.strip_suffix(EXTENSION)?.strip_prefix("L-")?;

        // The signature is free-form; everything after it is digits.
        let split = stem.rfind("-E-")?;
        let signature = &stem[..split];
        let rest = &stem[split + 3..];

        let (epoch, rest) = rest.split_once("-A-")?;
        let (points, rest) = rest.split_once("-T-")?;
        let (timestamp, collision) = match rest.split_once('-') {
            Some((ts, n)) => (ts, Some(n.parse().ok()?)),
            None => (rest, None),
        };

        let basis_points: u32 = points.parse().ok()?;
        if signature.is_empty() || timestamp.is_empty() || basis_points > BASIS_POINTS_SCALE as u32 {
            return None;
        }

        Some(CheckpointName {
            signature: signature.to_owned(),
            epoch: epoch.parse().ok()?,
            basis_points,
            timestamp: timestamp.to_owned(),
            collision,
        })
    }
}

impl fmt::Display for CheckpointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "L-{}-E-{}-A-{:05}-T-{}",
            self.signature, self.epoch, self.basis_points, self.timestamp
        )?;
        if let Some(n) = self.collision {
            write!(f, "-{n}")?;
        }
        f.write_str(EXTENSION)
    }
}
