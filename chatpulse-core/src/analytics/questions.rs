//! Question and outbound link rankings

use std::collections::HashSet;

use serde::Serialize;

use super::{count_values, ranked};
use crate::types::SessionAnalysis;

/// A question visitors asked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStat {
    pub question: String,
    pub frequency: usize,
    /// False when the question appears in any analysis's unanswered list
    pub answered: bool,
}

/// A question and how often it went unanswered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionFrequency {
    pub question: String,
    pub frequency: usize,
}

/// Asked questions by frequency, descending, ties by question text.
pub fn question_analytics(analyses: &[SessionAnalysis]) -> Vec<QuestionStat> {
    let unanswered: HashSet<&str> = analyses
        .iter()
        .flat_map(|a| a.unanswered_questions.iter().map(String::as_str))
        .collect();
    let asked = count_values(
        analyses
            .iter()
            .flat_map(|a| a.questions.iter().map(String::as_str)),
    );

    ranked(asked)
        .into_iter()
        .map(|(question, frequency)| QuestionStat {
            question: question.to_string(),
            frequency,
            answered: !unanswered.contains(question),
        })
        .collect()
}

/// Unanswered questions by frequency, descending, ties by question text.
pub fn unanswered_questions(analyses: &[SessionAnalysis]) -> Vec<QuestionFrequency> {
    let counts = count_values(
        analyses
            .iter()
            .flat_map(|a| a.unanswered_questions.iter().map(String::as_str)),
    );
    ranked(counts)
        .into_iter()
        .map(|(question, frequency)| QuestionFrequency {
            question: question.to_string(),
            frequency,
        })
        .collect()
}

/// A link and how many times it was surfaced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkCount {
    pub link: String,
    pub count: usize,
}

/// Most surfaced outbound URLs and email addresses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundLinks {
    pub urls: Vec<LinkCount>,
    pub emails: Vec<LinkCount>,
}

/// Top `limit` URLs and emails by frequency.
pub fn outbound_links(analyses: &[SessionAnalysis], limit: usize) -> OutboundLinks {
    let top = |links: Vec<&str>| -> Vec<LinkCount> {
        ranked(count_values(links))
            .into_iter()
            .take(limit)
            .map(|(link, count)| LinkCount {
                link: link.to_string(),
                count,
            })
            .collect()
    };
    OutboundLinks {
        urls: top(analyses.iter().flat_map(|a| a.urls.iter().map(String::as_str)).collect()),
        emails: top(analyses.iter().flat_map(|a| a.emails.iter().map(String::as_str)).collect()),
    }
}
