use ndarray::{s, ArrayD, Axis};
use serde::{Deserialize, Serialize};

use crate::codec::INF_SIZE;
use crate::error::DecodeError;
use crate::labels::COCO_CLASSES;

/// Minimum class score for keeping a candidate box.
pub const CONF_THRESHOLD: f32 = 0.5;

const CXYWH_OFFSET: usize = 4;

/// One decoded bounding box. Corner coordinates are normalized to [0,1]
/// relative to the original frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub score: f32,
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

/// Converts raw detector output `(1, 84, N)` into labeled boxes.
///
/// Candidates below the confidence threshold are discarded; the rest are
/// emitted in raw column order. No non-maximum suppression and no [0,1]
/// clamping are applied: overlapping or out-of-frame boxes are part of the
/// stream's observable output and downstream consumers rely on seeing them
/// unchanged.
#[derive(Debug, Clone)]
pub struct DetectionDecoder {
    conf: f32,
    input_size: f32,
}

impl Default for DetectionDecoder {
    fn default() -> Self {
        Self {
            conf: CONF_THRESHOLD,
            input_size: INF_SIZE as f32,
        }
    }
}

impl DetectionDecoder {
    pub fn new(conf: f32, input_size: u32) -> Self {
        Self {
            conf,
            input_size: input_size as f32,
        }
    }

    pub fn conf(&self) -> f32 {
        self.conf
    }

    pub fn decode(&self, raw: &ArrayD<f32>) -> Result<Vec<Detection>, DecodeError> {
        let rows = CXYWH_OFFSET + COCO_CLASSES.len();
        let shape = raw.shape();
        if shape.len() != 3 || shape[0] != 1 || shape[1] != rows {
            return Err(DecodeError::Shape {
                got: shape.to_vec(),
                rows,
            });
        }

        let preds = raw.index_axis(Axis(0), 0);
        let mut detections = Vec::new();
        for pred in preds.axis_iter(Axis(1)) {
            let clss = pred.slice(s![CXYWH_OFFSET..]);

            // First-index tie-break on equal maxima.
            let (class_id, &prob) = clss
                .into_iter()
                .enumerate()
                .reduce(|max, x| if x.1 > max.1 { x } else { max })
                .unwrap();

            if prob < self.conf {
                continue;
            }

            let (xc, yc, w, h) = (pred[0], pred[1], pred[2], pred[3]);
            detections.push(Detection {
                label: COCO_CLASSES[class_id].to_string(),
                score: prob,
                xmin: (xc - w / 2.0) / self.input_size,
                ymin: (yc - h / 2.0) / self.input_size,
                xmax: (xc + w / 2.0) / self.input_size,
                ymax: (yc + h / 2.0) / self.input_size,
            });
        }

        Ok(detections)
    }
}
