//! Emotion prediction over a loaded classifier.

use candle_core::Tensor;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{Result, VisionError};
use crate::labels::Emotion;
use crate::preprocess::preprocess_image;

/// A loaded, read-only emotion model.
///
/// Implementations are shared across request handlers, so `classify` must
/// not mutate state.
pub trait Classifier: Send + Sync {
    /// Class probabilities for a `(1, height, width, 1)` input tensor,
    /// index-aligned with [`Emotion::ALL`].
    fn classify(&self, input: &Tensor) -> Result<Vec<f32>>;
}

/// Outcome of one prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub emotion: Emotion,
    pub confidence: f32,
    /// Every label with its probability, in label order.
    #[serde(serialize_with = "serialize_scores")]
    pub all_predictions: Vec<(Emotion, f32)>,
}

impl Prediction {
    /// Pairs a probability vector with the label set and picks the arg-max.
    /// The first maximum wins on ties.
    pub fn from_probabilities(probabilities: &[f32]) -> Result<Self> {
        if probabilities.len() != Emotion::COUNT {
            return Err(VisionError::Inference(format!(
                "classifier returned {} scores for {} labels",
                probabilities.len(),
                Emotion::COUNT
            )));
        }

        let mut best = 0;
        for (i, &p) in probabilities.iter().enumerate().skip(1) {
            if p > probabilities[best] {
                best = i;
            }
        }

        Ok(Self {
            emotion: Emotion::ALL[best],
            confidence: probabilities[best],
            all_predictions: Emotion::ALL
                .iter()
                .copied()
                .zip(probabilities.iter().copied())
                .collect(),
        })
    }
}

fn serialize_scores<S: Serializer>(
    scores: &[(Emotion, f32)],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(scores.len()))?;
    for (emotion, probability) in scores {
        map.serialize_entry(emotion.as_str(), probability)?;
    }
    map.end()
}

/// Decodes an uploaded image and classifies it.
pub fn predict_emotion(classifier: &dyn Classifier, image_bytes: &[u8]) -> Result<Prediction> {
    let input = preprocess_image(image_bytes)?;
    let probabilities = classifier.classify(&input)?;
    Prediction::from_probabilities(&probabilities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, ImageFormat, Luma};
    use std::io::Cursor;
    use std::sync::Mutex;

    /// Returns fixed scores and remembers the input shapes it saw.
    struct Fixed {
        scores: Vec<f32>,
        seen: Mutex<Vec<Vec<usize>>>,
    }

    impl Fixed {
        fn new(scores: &[f32]) -> Self {
            Self {
                scores: scores.to_vec(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Classifier for Fixed {
        fn classify(&self, input: &Tensor) -> Result<Vec<f32>> {
            self.seen.lock().unwrap().push(input.dims().to_vec());
            Ok(self.scores.clone())
        }
    }

    fn gray_png(size: u32, value: u8) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(GrayImage::from_pixel(size, size, Luma([value])))
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_argmax_selects_label_and_confidence() {
        let scores = [0.05, 0.05, 0.1, 0.6, 0.1, 0.05, 0.05];
        let prediction = Prediction::from_probabilities(&scores).unwrap();

        assert_eq!(prediction.emotion, Emotion::Happy);
        assert_eq!(prediction.confidence, 0.6);
        assert_eq!(prediction.all_predictions.len(), 7);
        assert_eq!(prediction.all_predictions[3], (Emotion::Happy, 0.6));
    }

    #[test]
    fn test_first_maximum_wins() {
        let scores = [0.1, 0.3, 0.3, 0.1, 0.1, 0.05, 0.05];
        let prediction = Prediction::from_probabilities(&scores).unwrap();
        assert_eq!(prediction.emotion, Emotion::Disgust);
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let err = Prediction::from_probabilities(&[0.5, 0.5]).unwrap_err();
        assert!(matches!(err, VisionError::Inference(_)));
        assert!(err.to_string().contains("2 scores for 7 labels"));
    }

    #[test]
    fn test_json_shape() {
        let scores = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        let prediction = Prediction::from_probabilities(&scores).unwrap();
        let json = serde_json::to_value(&prediction).unwrap();

        assert_eq!(json["emotion"], "surprise");
        assert_eq!(json["confidence"], 1.0);
        let all = json["all_predictions"].as_object().unwrap();
        assert_eq!(all.len(), 7);
        for emotion in Emotion::ALL {
            assert!(all.contains_key(emotion.as_str()));
        }
        assert_eq!(all["surprise"], 1.0);
    }

    #[test]
    fn test_json_keeps_label_order() {
        let prediction = Prediction::from_probabilities(&[0.1; 7]).unwrap();
        let text = serde_json::to_string(&prediction).unwrap();

        let positions: Vec<usize> = Emotion::ALL
            .iter()
            .map(|e| text.find(&format!("\"{}\":", e)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_predict_runs_preprocessed_input() {
        let classifier = Fixed::new(&[0.1, 0.1, 0.1, 0.1, 0.4, 0.1, 0.1]);
        let prediction = predict_emotion(&classifier, &gray_png(48, 128)).unwrap();

        assert_eq!(prediction.emotion, Emotion::Neutral);
        assert_eq!(*classifier.seen.lock().unwrap(), vec![vec![1, 48, 48, 1]]);
    }

    #[test]
    fn test_predict_never_classifies_undecodable_input() {
        let classifier = Fixed::new(&[1.0 / 7.0; 7]);
        let err = predict_emotion(&classifier, b"GIF89a-but-not-really").unwrap_err();

        assert!(matches!(err, VisionError::ImageProcessing(_)));
        assert!(classifier.seen.lock().unwrap().is_empty());
    }
}
