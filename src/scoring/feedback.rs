//! Rule-based learner feedback.
//!
//! Pure function of the final scores: one `overall` sentence by total-score
//! band, a strength for every score `≥ 70`, an improvement area for every
//! score `< 60`, and recommendation pairs gated independently on the verbal,
//! paraverbal and originality macro-scores.

use serde::{Deserialize, Serialize};

use crate::scoring::aggregate::SubScores;

const STRENGTH_THRESHOLD: f64 = 70.0;
const IMPROVEMENT_THRESHOLD: f64 = 60.0;
const RECOMMENDATION_THRESHOLD: f64 = 60.0;

/// `(score accessor, strength clause, improvement clause)` in report order.
type Rule = (fn(&SubScores) -> f64, &'static str, &'static str);

const RULES: [Rule; 7] = [
    (
        |s| s.fluency,
        "Your speech is fluent and natural",
        "Work on fluency and reducing pauses",
    ),
    (
        |s| s.vocabulary,
        "You demonstrate good vocabulary range",
        "Expand your vocabulary range",
    ),
    (
        |s| s.structure,
        "Your grammar and sentence structure are solid",
        "Focus on grammar and sentence structure",
    ),
    (
        |s| s.pitch,
        "Good pitch variation and intonation",
        "Add more pitch variation to sound more engaging",
    ),
    (
        |s| s.pace,
        "Appropriate speaking pace",
        "Adjust your speaking pace",
    ),
    (
        |s| s.energy,
        "Your voice carries good energy and dynamics",
        "Vary your vocal energy and volume",
    ),
    (
        |s| s.originality,
        "Your content shows creativity and originality",
        "Try to be more original and creative in your content",
    ),
];

const VERBAL_RECOMMENDATIONS: [&str; 2] = [
    "Read more in the target language to improve vocabulary and structure",
    "Practice speaking regularly, even if just to yourself",
];
const PARAVERBAL_RECOMMENDATIONS: [&str; 2] = [
    "Record yourself and listen back to improve your delivery",
    "Practice with varied intonation and emphasis",
];
const ORIGINALITY_RECOMMENDATIONS: [&str; 2] = [
    "Think critically and develop your own perspectives",
    "Explore diverse topics and ideas",
];

/// Transcript-quality note attached when verbal scores were penalised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionQualityNote {
    pub issues: Vec<String>,
    pub warning: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub overall: String,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription_quality: Option<TranscriptionQualityNote>,
}

/// Build feedback for `scores`.
pub fn generate_feedback(scores: &SubScores) -> Feedback {
    let total = scores.total_score();

    let overall = if total >= 80.0 {
        "Excellent performance! You demonstrate strong communication skills."
    } else if total >= 60.0 {
        "Good performance! You show solid communication abilities with room for growth."
    } else if total >= 40.0 {
        "Fair performance. With practice, you can significantly improve."
    } else {
        "Keep practicing! There's substantial room for improvement."
    };

    let strengths = RULES
        .iter()
        .filter(|(score, _, _)| score(scores) >= STRENGTH_THRESHOLD)
        .map(|(_, strength, _)| strength.to_string())
        .collect();

    let areas_for_improvement = RULES
        .iter()
        .filter(|(score, _, _)| score(scores) < IMPROVEMENT_THRESHOLD)
        .map(|(_, _, area)| area.to_string())
        .collect();

    let gates = [
        (scores.verbal_score(), VERBAL_RECOMMENDATIONS),
        (scores.paraverbal_score(), PARAVERBAL_RECOMMENDATIONS),
        (scores.originality, ORIGINALITY_RECOMMENDATIONS),
    ];
    let recommendations = gates
        .iter()
        .filter(|(score, _)| *score < RECOMMENDATION_THRESHOLD)
        .flat_map(|(_, texts)| texts.iter().map(|t| t.to_string()))
        .collect();

    Feedback {
        overall: overall.to_string(),
        strengths,
        areas_for_improvement,
        recommendations,
        transcription_quality: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(verbal: f64, paraverbal: f64, originality: f64) -> SubScores {
        SubScores {
            fluency: verbal,
            vocabulary: verbal,
            structure: verbal,
            pitch: paraverbal,
            pace: paraverbal,
            energy: paraverbal,
            originality,
        }
    }

    #[test]
    fn overall_bands() {
        assert!(generate_feedback(&scores(90.0, 90.0, 90.0)).overall.starts_with("Excellent"));
        assert!(generate_feedback(&scores(65.0, 65.0, 65.0)).overall.starts_with("Good"));
        assert!(generate_feedback(&scores(45.0, 45.0, 45.0)).overall.starts_with("Fair"));
        assert!(generate_feedback(&scores(10.0, 10.0, 10.0)).overall.starts_with("Keep practicing"));
    }

    #[test]
    fn strong_speaker_gets_all_strengths_and_no_advice() {
        let f = generate_feedback(&scores(85.0, 85.0, 85.0));
        assert_eq!(f.strengths.len(), 7);
        assert!(f.areas_for_improvement.is_empty());
        assert!(f.recommendations.is_empty());
    }

    #[test]
    fn scores_between_thresholds_are_neither() {
        let f = generate_feedback(&scores(65.0, 65.0, 65.0));
        assert!(f.strengths.is_empty());
        assert!(f.areas_for_improvement.is_empty());
    }

    #[test]
    fn recommendation_gates_fire_independently() {
        let f = generate_feedback(&scores(40.0, 80.0, 30.0));
        assert_eq!(
            f.recommendations,
            vec![
                VERBAL_RECOMMENDATIONS[0],
                VERBAL_RECOMMENDATIONS[1],
                ORIGINALITY_RECOMMENDATIONS[0],
                ORIGINALITY_RECOMMENDATIONS[1],
            ]
        );
        assert!(f.strengths.contains(&"Appropriate speaking pace".to_string()));
        assert!(f
            .areas_for_improvement
            .contains(&"Expand your vocabulary range".to_string()));
    }

    #[test]
    fn zeroed_paraverbal_branch_is_flagged() {
        let f = generate_feedback(&scores(80.0, 0.0, 80.0));
        assert_eq!(f.recommendations, PARAVERBAL_RECOMMENDATIONS.to_vec());
        assert!(f
            .areas_for_improvement
            .contains(&"Vary your vocal energy and volume".to_string()));
    }

    #[test]
    fn feedback_is_deterministic() {
        let s = scores(55.0, 72.0, 61.0);
        assert_eq!(generate_feedback(&s), generate_feedback(&s));
    }
}
