//! Extractive transcript summaries.
//!
//! Sentences are scored by the normalised frequency of their content words
//! and the best ones are returned in playback order. Nothing is generated;
//! every sentence in a summary appears in the transcript.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::youtube::Transcript;

/// Message returned for transcripts without text.
pub const EMPTY_TRANSCRIPT: &str = "No transcript available to summarize.";

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "that", "this", "with", "you", "are", "was", "were", "have", "has",
    "had", "but", "not", "all", "any", "can", "will", "just", "they", "them", "their", "there",
    "then", "than", "what", "when", "where", "which", "who", "how", "why", "from", "into",
    "about", "your", "our", "its", "it's", "i'm", "we're", "don't", "can't", "also", "very",
    "really", "going", "gonna", "get", "got", "like", "some", "more", "one", "out", "know",
    "think", "would", "could", "should", "been", "being", "these", "those", "because", "here",
    "okay", "yeah", "thing", "things", "lot", "kind", "want",
];

/// Chunk size, in words, for transcripts without punctuation.
const CHUNK_WORDS: usize = 20;

/// The available summary styles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SummaryType {
    /// Three sentences.
    Brief,
    /// Ten sentences in short paragraphs.
    #[default]
    Detailed,
    /// Seven bullet points.
    BulletPoints,
    /// Up to five timestamped quotes.
    KeyQuotes,
    /// One line per section of the video.
    Chapters,
}

impl SummaryType {
    /// All variants, in documentation order.
    pub const ALL: [Self; 5] = [
        Self::Brief,
        Self::Detailed,
        Self::BulletPoints,
        Self::KeyQuotes,
        Self::Chapters,
    ];

    /// The name used in tool arguments.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Brief => "brief",
            Self::Detailed => "detailed",
            Self::BulletPoints => "bullet_points",
            Self::KeyQuotes => "key_quotes",
            Self::Chapters => "chapters",
        }
    }
}

impl fmt::Display for SummaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|t| t.as_str()).collect();
                format!(
                    "Invalid summary_type '{s}'. Must be one of: {}",
                    names.join(", ")
                )
            })
    }
}

#[derive(Debug, Clone)]
struct Sentence {
    text: String,
    start: f64,
    score: f64,
}

impl Sentence {
    fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

fn filler_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // "like", "so", "well" and "right" carry meaning unless set off by a comma.
        Regex::new(
            r"(?i)\b(?:um+|uh+|you know|i mean|basically|actually|literally)\b,?\s*|\b(?:like|so|well|right),\s*",
        )
        .expect("filler pattern is valid")
    })
}

fn clean_text(text: &str) -> String {
    let without_fillers = filler_pattern().replace_all(text, "");
    without_fillers.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits the transcript into sentences, each tagged with the start time of
/// the segment it begins in.
fn split_sentences(transcript: &Transcript) -> Vec<Sentence> {
    let cleaned: Vec<(f64, String)> = transcript
        .segments
        .iter()
        .map(|s| (s.start, clean_text(&s.text)))
        .filter(|(_, text)| !text.is_empty())
        .collect();

    let punctuated = cleaned
        .iter()
        .any(|(_, text)| text.contains(['.', '!', '?']));

    if !punctuated {
        return chunk_segments(&cleaned);
    }

    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut current_start = 0.0;

    for (start, text) in &cleaned {
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            if current.trim().is_empty() && !c.is_whitespace() {
                current.clear();
                current_start = *start;
            }
            current.push(c);
            let ends_sentence = matches!(c, '.' | '!' | '?')
                && !matches!(chars.peek(), Some('.' | '!' | '?'));
            if ends_sentence {
                push_sentence(&mut sentences, &current, current_start);
                current.clear();
            }
        }
        current.push(' ');
    }
    push_sentence(&mut sentences, &current, current_start);
    sentences
}

fn push_sentence(sentences: &mut Vec<Sentence>, text: &str, start: f64) {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().any(char::is_alphanumeric) {
        sentences.push(Sentence {
            text,
            start,
            score: 0.0,
        });
    }
}

/// Groups unpunctuated segments into pseudo-sentences of about
/// `CHUNK_WORDS` words.
fn chunk_segments(segments: &[(f64, String)]) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut current_start = 0.0;

    for (start, text) in segments {
        if current.is_empty() {
            current_start = *start;
        } else {
            current.push(' ');
        }
        current.push_str(text);
        if current.split_whitespace().count() >= CHUNK_WORDS {
            push_sentence(&mut sentences, &current, current_start);
            current.clear();
        }
    }
    push_sentence(&mut sentences, &current, current_start);
    sentences
}

fn content_words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(&w.as_str()))
}

#[allow(clippy::cast_precision_loss)]
fn score_sentences(sentences: &mut [Sentence]) {
    let mut frequencies: HashMap<String, usize> = HashMap::new();
    for sentence in sentences.iter() {
        for word in content_words(&sentence.text) {
            *frequencies.entry(word).or_default() += 1;
        }
    }
    let max = frequencies.values().copied().max().unwrap_or(1) as f64;

    for sentence in sentences.iter_mut() {
        let words: Vec<String> = content_words(&sentence.text).collect();
        if words.is_empty() {
            continue;
        }
        let total: f64 = words
            .iter()
            .map(|w| frequencies.get(w).copied().unwrap_or(0) as f64 / max)
            .sum();
        // Very short fragments rarely stand alone.
        let length_factor = if sentence.word_count() < 4 { 0.5 } else { 1.0 };
        sentence.score = total / words.len() as f64 * length_factor;
    }
}

/// Indices of the best `n` sentences accepted by `keep`, in playback order.
fn top_sentences(sentences: &[Sentence], n: usize, keep: impl Fn(&Sentence) -> bool) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..sentences.len())
        .filter(|&i| keep(&sentences[i]))
        .collect();
    ranked.sort_by(|&a, &b| {
        sentences[b]
            .score
            .partial_cmp(&sentences[a].score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    ranked.truncate(n);
    ranked.sort_unstable();
    ranked
}

/// Formats seconds as `mm:ss`, or `h:mm:ss` from one hour on.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

fn truncate_words(text: &str, max_words: usize) -> String {
    let mut words = 0;
    let mut in_word = false;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            in_word = false;
        } else if !in_word {
            in_word = true;
            words += 1;
            if words > max_words {
                return format!("{}...", text[..i].trim_end());
            }
        }
    }
    text.to_string()
}

fn render_brief(sentences: &[Sentence]) -> String {
    top_sentences(sentences, 3, |_| true)
        .into_iter()
        .map(|i| sentences[i].text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_detailed(sentences: &[Sentence]) -> String {
    let picked: Vec<&str> = top_sentences(sentences, 10, |_| true)
        .into_iter()
        .map(|i| sentences[i].text.as_str())
        .collect();
    picked
        .chunks(3)
        .map(|paragraph| paragraph.join(" "))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_bullets(sentences: &[Sentence]) -> String {
    top_sentences(sentences, 7, |_| true)
        .into_iter()
        .map(|i| format!("- {}", sentences[i].text))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_quotes(sentences: &[Sentence]) -> String {
    let quotable = |s: &Sentence| (8..=40).contains(&s.word_count());
    let mut picked = top_sentences(sentences, 5, quotable);
    if picked.is_empty() {
        picked = top_sentences(sentences, 5, |_| true);
    }
    picked
        .into_iter()
        .map(|i| {
            format!(
                "[{}] \"{}\"",
                format_timestamp(sentences[i].start),
                sentences[i].text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn render_chapters(sentences: &[Sentence], duration_seconds: f64) -> String {
    let window = (duration_seconds / 5.0).max(60.0);
    let count = ((duration_seconds / window).ceil() as usize).max(1);

    let mut lines = Vec::new();
    for chapter in 0..count {
        let from = chapter as f64 * window;
        let to = from + window;
        let last = chapter + 1 == count;
        let in_window = |s: &Sentence| s.start >= from && (s.start < to || last);
        if let Some(&best) = top_sentences(sentences, 1, in_window).first() {
            lines.push(format!(
                "[{}] {}",
                format_timestamp(from),
                truncate_words(&sentences[best].text, 25)
            ));
        }
    }
    lines.join("\n")
}

/// Summarises a transcript.
///
/// `max_length` caps the summary body at that many words.
#[must_use]
pub fn summarize(
    transcript: &Transcript,
    summary_type: SummaryType,
    max_length: Option<usize>,
) -> String {
    if transcript.is_empty() {
        return EMPTY_TRANSCRIPT.to_string();
    }

    let mut sentences = split_sentences(transcript);
    if sentences.is_empty() {
        return EMPTY_TRANSCRIPT.to_string();
    }
    score_sentences(&mut sentences);

    let body = match summary_type {
        SummaryType::Brief => render_brief(&sentences),
        SummaryType::Detailed => render_detailed(&sentences),
        SummaryType::BulletPoints => render_bullets(&sentences),
        SummaryType::KeyQuotes => render_quotes(&sentences),
        SummaryType::Chapters => render_chapters(&sentences, transcript.duration_seconds),
    };
    let body = match max_length {
        Some(max) => truncate_words(&body, max),
        None => body,
    };

    format!(
        "Summary ({summary_type}) | Video duration: {} minutes | {} sentences analysed\n\n{body}",
        transcript.duration_minutes,
        sentences.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::TranscriptSegment;

    fn transcript(parts: &[(&str, f64)]) -> Transcript {
        let segments = parts
            .iter()
            .map(|(text, start)| TranscriptSegment {
                text: (*text).to_string(),
                start: *start,
                duration: 4.0,
            })
            .collect();
        Transcript::from_segments("vid", Some("en".to_string()), segments)
    }

    fn lecture() -> Transcript {
        transcript(&[
            ("Um, today we talk about Rust ownership.", 0.0),
            ("Ownership decides who frees memory.", 30.0),
            ("The borrow checker enforces ownership rules at compile time.", 70.0),
            ("I like coffee.", 130.0),
            ("Borrowing lets code read memory without taking ownership of it.", 190.0),
            ("Lifetimes describe how long borrowed memory stays valid for the borrow checker.", 250.0),
            ("Thanks for watching!", 296.0),
        ])
    }

    #[test]
    fn parse_summary_types() {
        assert_eq!("brief".parse::<SummaryType>().unwrap(), SummaryType::Brief);
        assert_eq!(
            "Bullet_Points".parse::<SummaryType>().unwrap(),
            SummaryType::BulletPoints
        );
        let err = "poem".parse::<SummaryType>().unwrap_err();
        assert!(err.contains("key_quotes"));
        assert_eq!(SummaryType::default(), SummaryType::Detailed);
    }

    #[test]
    fn fillers_are_removed() {
        assert_eq!(
            clean_text("Um, so, you know, it basically works"),
            "it works"
        );
        assert_eq!(clean_text("I like this so much"), "I like this so much");
    }

    #[test]
    fn sentences_keep_their_start_time() {
        let t = transcript(&[("First part of one", 0.0), ("sentence. Second one!", 5.0)]);
        let sentences = split_sentences(&t);
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].text, "First part of one sentence.");
        assert!(sentences[0].start.abs() < f64::EPSILON);
        assert_eq!(sentences[1].text, "Second one!");
        assert!((sentences[1].start - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unpunctuated_transcripts_are_chunked() {
        let parts: Vec<(String, f64)> = (0..10)
            .map(|i| ("word ".repeat(5).trim_end().to_string(), f64::from(i) * 3.0))
            .collect();
        let refs: Vec<(&str, f64)> = parts.iter().map(|(t, s)| (t.as_str(), *s)).collect();
        let sentences = split_sentences(&transcript(&refs));
        // 50 words in 20-word chunks
        assert_eq!(sentences.len(), 3);
        assert!((sentences[1].start - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn brief_prefers_central_sentences() {
        let summary = summarize(&lecture(), SummaryType::Brief, None);
        assert!(summary.starts_with("Summary (brief)"));
        assert!(summary.contains("borrow checker"));
        assert!(!summary.contains("coffee"));
    }

    #[test]
    fn bullet_points_are_bulleted() {
        let summary = summarize(&lecture(), SummaryType::BulletPoints, None);
        let body = summary.split("\n\n").nth(1).unwrap();
        assert!(body.lines().all(|l| l.starts_with("- ")));
        assert!(!body.to_lowercase().contains("um,"));
    }

    #[test]
    fn key_quotes_have_timestamps() {
        let summary = summarize(&lecture(), SummaryType::KeyQuotes, None);
        assert!(summary.contains("[01:10] \"The borrow checker"));
    }

    #[test]
    fn chapters_cover_the_video() {
        let summary = summarize(&lecture(), SummaryType::Chapters, None);
        let body = summary.split("\n\n").nth(1).unwrap();
        assert!(body.starts_with("[00:00]"));
        assert!(body.lines().count() >= 4);
    }

    #[test]
    fn max_length_truncates_body() {
        let summary = summarize(&lecture(), SummaryType::Detailed, Some(5));
        let body = summary.split("\n\n").nth(1).unwrap();
        assert!(body.ends_with("..."));
        assert_eq!(body.trim_end_matches("...").split_whitespace().count(), 5);
    }

    #[test]
    fn empty_transcript_message() {
        let t = Transcript::from_segments("vid", None, Vec::new());
        assert_eq!(summarize(&t, SummaryType::Brief, None), EMPTY_TRANSCRIPT);
    }

    #[test]
    fn timestamps() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(75.9), "01:15");
        assert_eq!(format_timestamp(3725.0), "1:02:05");
    }
}
