//! Console rendering of a `RagAnswer`

use super::pipeline::RagAnswer;

/// Wrap width for retrieved passages
pub const PASSAGE_WIDTH: usize = 70;

/// Wrap width for the generated answer
pub const ANSWER_WIDTH: usize = 75;

const RULE_WIDTH: usize = 80;

/// Greedy word wrap. Lines never exceed `width` unless a single word does.
pub fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

pub fn render_answer(answer: &RagAnswer) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);

    let mut lines = vec![
        heavy.clone(),
        "RAG SYSTEM ANALYSIS".to_string(),
        heavy.clone(),
        format!("Question: {}", answer.question),
        light.clone(),
        "RETRIEVED CONTEXT:".to_string(),
    ];

    if answer.passages.is_empty() {
        lines.push("   No relevant context found".to_string());
    } else {
        for (i, passage) in answer.passages.iter().enumerate() {
            lines.push(format!("   [{}] Similarity: {:.3}", i + 1, passage.similarity));
            lines.extend(
                wrap_words(&passage.content, PASSAGE_WIDTH)
                    .into_iter()
                    .map(|line| format!("       {}", line)),
            );
            lines.push(String::new());
        }
    }

    lines.push(light);
    lines.push("GENERATED ANSWER:".to_string());
    lines.extend(
        wrap_words(&answer.answer, ANSWER_WIDTH)
            .into_iter()
            .map(|line| format!("   {}", line)),
    );
    lines.push(heavy);

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::ScoredChunk;

    #[test]
    fn test_wrap_respects_width() {
        let text = "Wolverine and Deadpool finally shared the screen after years of teasing from both studios";
        let lines = wrap_words(text, 20);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= 20));
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_long_word_stands_alone() {
        let lines = wrap_words("a supercalifragilistic b", 5);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn test_wrap_empty() {
        assert!(wrap_words("", 70).is_empty());
        assert!(wrap_words("   ", 70).is_empty());
    }

    #[test]
    fn test_render_with_passages() {
        let answer = RagAnswer {
            question: "Have Wolverine and Deadpool ever met?".to_string(),
            passages: vec![ScoredChunk {
                similarity: 0.8766,
                content: "They team up in Deadpool & Wolverine.".to_string(),
            }],
            answer: "Yes.".to_string(),
        };

        let text = render_answer(&answer);
        assert!(text.contains("Question: Have Wolverine and Deadpool ever met?"));
        assert!(text.contains("   [1] Similarity: 0.877\n       They team up in Deadpool & Wolverine.\n"));
        assert!(text.contains("GENERATED ANSWER:\n   Yes.\n"));
        assert!(!text.contains("No relevant context found"));
    }

    #[test]
    fn test_render_without_passages() {
        let answer = RagAnswer {
            question: "q".to_string(),
            passages: Vec::new(),
            answer: "API ERROR (NetworkError): Unable to generate response".to_string(),
        };

        let text = render_answer(&answer);
        assert!(text.contains("No relevant context found"));
        assert!(text.contains("   API ERROR (NetworkError): Unable to generate response"));
    }
}
