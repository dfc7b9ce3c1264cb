//! IDX decoding for MNIST-style datasets (MNIST, Fashion-MNIST, EMNIST, ...).
//!
//! # IDX3 image file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x03        (number of dimensions = 3)
//! bytes  4-7:   N           (number of images, big-endian u32)
//! bytes  8-11:  rows        (big-endian u32)
//! bytes 12-15:  cols        (big-endian u32)
//! bytes 16..:   N * rows * cols bytes, row-major, uint8
//! ```
//!
//! # IDX1 label file layout
//! ```text
//! bytes  0-1:   0x00 0x00
//! byte   2:     0x08
//! byte   3:     0x01
//! bytes  4-7:   N           (number of labels, big-endian u32)
//! bytes  8..:   N bytes, each a class index
//! ```

use std::fs;
use std::path::Path;

use log::debug;

use crate::data::sample::Sample;
use crate::error::DataError;

const IMAGE_HEADER: usize = 16;
const LABEL_HEADER: usize = 8;

/// Scale applied to raw pixel bytes; maps 0..=255 into [0, 1).
const PIXEL_SCALE: f64 = 256.0;

fn be_u32(bytes: &[u8], at: usize) -> usize {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as usize
}

fn check_header(bytes: &[u8], kind: &'static str, dims: u8, header: usize) -> Result<(), DataError> {
    if bytes.len() < header {
        return Err(DataError::Truncated { kind, needed: header, actual: bytes.len() });
    }
    if bytes[0] != 0x00 || bytes[1] != 0x00 {
        return Err(DataError::BadHeader {
            kind,
            reason: format!("reserved bytes must be zero, got 0x{:02X} 0x{:02X}", bytes[0], bytes[1]),
        });
    }
    if bytes[2] != 0x08 {
        return Err(DataError::BadHeader {
            kind,
            reason: format!("dtype must be 0x08 (uint8), got 0x{:02X}", bytes[2]),
        });
    }
    if bytes[3] != dims {
        return Err(DataError::BadHeader {
            kind,
            reason: format!("expected {dims} dimensions, got {}", bytes[3]),
        });
    }
    Ok(())
}

/// Decodes an image/label file pair into samples with one-hot targets.
pub fn parse_idx_pair(
    image_bytes: &[u8],
    label_bytes: &[u8],
    n_classes: usize,
) -> Result<Vec<Sample>, DataError> {
    if n_classes < 2 {
        return Err(DataError::TooFewClasses(n_classes));
    }

    check_header(image_bytes, "image", 0x03, IMAGE_HEADER)?;
    check_header(label_bytes, "label", 0x01, LABEL_HEADER)?;

    let n_images = be_u32(image_bytes, 4);
    let rows = be_u32(image_bytes, 8);
    let cols = be_u32(image_bytes, 12);
    let n_labels = be_u32(label_bytes, 4);

    if n_images != n_labels {
        return Err(DataError::CountMismatch { images: n_images, labels: n_labels });
    }

    let n_pixels = rows.checked_mul(cols).ok_or_else(|| DataError::BadHeader {
        kind: "image",
        reason: format!("{rows}x{cols} overflows"),
    })?;
    let image_len = n_images
        .checked_mul(n_pixels)
        .and_then(|n| n.checked_add(IMAGE_HEADER))
        .ok_or_else(|| DataError::BadHeader {
            kind: "image",
            reason: format!("{n_images} images of {n_pixels} pixels overflows"),
        })?;
    if image_bytes.len() < image_len {
        return Err(DataError::Truncated { kind: "image", needed: image_len, actual: image_bytes.len() });
    }
    let label_len = LABEL_HEADER + n_labels;
    if label_bytes.len() < label_len {
        return Err(DataError::Truncated { kind: "label", needed: label_len, actual: label_bytes.len() });
    }
    if n_pixels == 0 && n_images > 0 {
        return Err(DataError::BadHeader { kind: "image", reason: "images have no pixels".to_owned() });
    }

    let pixels = &image_bytes[IMAGE_HEADER..image_len];
    let labels = &label_bytes[LABEL_HEADER..label_len];

    let mut samples = Vec::with_capacity(n_images);
    for (index, (&label, image)) in labels.iter().zip(pixels.chunks_exact(n_pixels.max(1))).enumerate() {
        let label = usize::from(label);
        if label >= n_classes {
            return Err(DataError::LabelOutOfRange { index, label, n_classes });
        }
        let features = image.iter().map(|&px| f64::from(px) / PIXEL_SCALE).collect();
        samples.push(Sample::new(features, label, n_classes));
    }

    debug!("decoded {} samples of {rows}x{cols} pixels", samples.len());
    Ok(samples)
}

/// Reads and decodes an image/label file pair from disk.
pub fn load_idx_pair(
    image_path: impl AsRef<Path>,
    label_path: impl AsRef<Path>,
    n_classes: usize,
) -> Result<Vec<Sample>, DataError> {
    let read = |path: &Path| {
        fs::read(path).map_err(|source| DataError::Io { path: path.to_path_buf(), source })
    };
    let images = read(image_path.as_ref())?;
    let labels = read(label_path.as_ref())?;
    parse_idx_pair(&images, &labels, n_classes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images(n: u32, rows: u32, cols: u32, pixels: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0x00, 0x00, 0x08, 0x03];
        bytes.extend_from_slice(&n.to_be_bytes());
        bytes.extend_from_slice(&rows.to_be_bytes());
        bytes.extend_from_slice(&cols.to_be_bytes());
        bytes.extend_from_slice(pixels);
        bytes
    }

    fn labels(values: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0x00, 0x00, 0x08, 0x01];
        bytes.extend_from_slice(&(values.len() as u32).to_be_bytes());
        bytes.extend_from_slice(values);
        bytes
    }

    #[test]
    fn decodes_two_images() {
        let img = images(2, 1, 2, &[0, 128, 255, 64]);
        let lbl = labels(&[3, 0]);
        let samples = parse_idx_pair(&img, &lbl, 10).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].features, vec![0.0, 0.5]);
        assert_eq!(samples[0].label, 3);
        assert_eq!(samples[0].targets[3], 1.0);
        assert_eq!(samples[1].features, vec![255.0 / 256.0, 0.25]);
        assert_eq!(samples[1].label, 0);
    }

    #[test]
    fn rejects_wrong_dimensions() {
        let mut img = images(1, 1, 1, &[0]);
        img[3] = 0x02;
        let err = parse_idx_pair(&img, &labels(&[0]), 10).unwrap_err();
        assert!(matches!(err, DataError::BadHeader { kind: "image", .. }));
    }

    #[test]
    fn rejects_truncated_pixels() {
        let img = images(2, 2, 2, &[0, 0, 0, 0, 0]);
        let err = parse_idx_pair(&img, &labels(&[0, 1]), 10).unwrap_err();
        assert!(matches!(err, DataError::Truncated { kind: "image", needed: 24, actual: 21 }));
    }

    #[test]
    fn rejects_count_mismatch() {
        let img = images(2, 1, 1, &[0, 0]);
        let err = parse_idx_pair(&img, &labels(&[0]), 10).unwrap_err();
        assert!(matches!(err, DataError::CountMismatch { images: 2, labels: 1 }));
    }

    #[test]
    fn rejects_out_of_range_label() {
        let img = images(1, 1, 1, &[0]);
        let err = parse_idx_pair(&img, &labels(&[7]), 5).unwrap_err();
        assert!(matches!(err, DataError::LabelOutOfRange { index: 0, label: 7, n_classes: 5 }));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let img_path = dir.path().join("imgs");
        let lbl_path = dir.path().join("lbls");
        fs::write(&img_path, images(1, 1, 3, &[1, 2, 3])).unwrap();
        fs::write(&lbl_path, labels(&[1])).unwrap();
        let samples = load_idx_pair(&img_path, &lbl_path, 2).unwrap();
        assert_eq!(samples[0].features.len(), 3);

        let missing = load_idx_pair(dir.path().join("nope"), &lbl_path, 2).unwrap_err();
        assert!(matches!(missing, DataError::Io { .. }));
    }
}
