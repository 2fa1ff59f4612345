use std::fs;
use std::path::Path;

use super::error::ClassifierError;

/// One output class of the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLabel {
    /// WordNet id when the label file has one, otherwise the class index
    pub id: String,
    pub label: String,
}

fn is_wordnet_id(token: &str) -> bool {
    token.len() == 9 && token.starts_with('n') && token[1..].bytes().all(|b| b.is_ascii_digit())
}

/// Parses one line of a label file.
///
/// `n03345487 fire engine, fire truck` becomes id `n03345487`, label
/// `fire_engine`. A line without a WordNet id is taken verbatim.
pub(crate) fn parse_label_line(index: usize, line: &str) -> ClassLabel {
    let line = line.trim();
    if let Some((head, rest)) = line.split_once(' ') {
        if is_wordnet_id(head) {
            let name = rest.split(',').next().unwrap_or(rest).trim();
            return ClassLabel {
                id: head.to_string(),
                label: name.split_whitespace().collect::<Vec<_>>().join("_"),
            };
        }
    }
    ClassLabel {
        id: index.to_string(),
        label: line.to_string(),
    }
}

pub(crate) fn parse_labels(contents: &str) -> Vec<ClassLabel> {
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| parse_label_line(i, line))
        .collect()
}

pub(crate) fn load_labels<P: AsRef<Path>>(path: P) -> Result<Vec<ClassLabel>, ClassifierError> {
    let contents = fs::read_to_string(path.as_ref()).map_err(|e| {
        ClassifierError::BuildError(format!("Failed to read labels {:?}: {}", path.as_ref(), e))
    })?;
    let labels = parse_labels(&contents);
    if labels.is_empty() {
        return Err(ClassifierError::BuildError("Label file contains no classes".into()));
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synset_line() {
        let label = parse_label_line(555, "n03345487 fire engine, fire truck");
        assert_eq!(label.id, "n03345487");
        assert_eq!(label.label, "fire_engine");
    }

    #[test]
    fn test_single_word_synset() {
        let label = parse_label_line(0, "n01440764 tench, Tinca tinca");
        assert_eq!(label.label, "tench");
    }

    #[test]
    fn test_plain_line() {
        let label = parse_label_line(7, "volcano");
        assert_eq!(label.id, "7");
        assert_eq!(label.label, "volcano");

        let label = parse_label_line(8, "fire engine");
        assert_eq!(label.id, "8");
        assert_eq!(label.label, "fire engine");
    }

    #[test]
    fn test_blank_lines_skipped() {
        let labels = parse_labels("n00000001 a\n\n  \nn00000002 b\n");
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[1].label, "b");
    }
}
