use super::classify::LevelType;
use super::errors::{ErrorLog, ErrorType, ExtractionError};
use super::numbering::{first_number, normalize, part_ordinal, subsection_parts, successor};
use super::tree::{Entry, SpecTree};

pub fn validate(tree: &SpecTree) -> ErrorLog {
    let mut errors = ErrorLog::new();

    let mut expected_part = first_number(LevelType::Part, None);
    for part in &tree.parts {
        check_synthetic(&part.entry, "Part", &mut errors);
        expected_part = check_sequence(&part.entry, LevelType::Part, "Part", expected_part, &mut errors);

        let part_ordinal = part_ordinal(&part.entry.number);
        let mut expected_subsection = first_number(LevelType::Subsection, Some(&part.entry.number));
        for subsection in &part.subsections {
            check_synthetic(&subsection.entry, "Subsection", &mut errors);

            let found_part = subsection_parts(&subsection.entry.number).map(|(major, _)| major);
            if part_ordinal.is_some() && found_part.is_some() && found_part != part_ordinal {
                errors.push(ExtractionError::new(
                    subsection.entry.line_number,
                    ErrorType::StructureError,
                    format!(
                        "Subsection {} does not belong to part {}",
                        subsection.entry.number, part.entry.number
                    ),
                    &context_of(&subsection.entry),
                ));
            } else {
                expected_subsection = check_sequence(
                    &subsection.entry,
                    LevelType::Subsection,
                    "Subsection",
                    expected_subsection,
                    &mut errors,
                );
            }

            let mut expected_item = first_number(LevelType::Item, None);
            for item in &subsection.items {
                check_synthetic(&item.entry, "Item", &mut errors);
                expected_item = check_sequence(&item.entry, LevelType::Item, "Item", expected_item, &mut errors);

                let mut expected_list = first_number(LevelType::List, None);
                for list in &item.lists {
                    check_synthetic(&list.entry, "List", &mut errors);
                    expected_list =
                        check_sequence(&list.entry, LevelType::List, "List", expected_list, &mut errors);

                    let mut expected_sub_list = first_number(LevelType::SubList, None);
                    for sub_list in &list.sub_lists {
                        expected_sub_list = check_sequence(
                            &sub_list.entry,
                            LevelType::SubList,
                            "Sub-list",
                            expected_sub_list,
                            &mut errors,
                        );
                    }
                }
            }
        }
    }

    errors
}

fn check_sequence(
    entry: &Entry,
    level_type: LevelType,
    label: &str,
    expected: Option<String>,
    errors: &mut ErrorLog,
) -> Option<String> {
    let found = normalize(level_type, &entry.number);
    let Some(expected) = expected else {
        return successor(level_type, &found);
    };

    if found != expected {
        errors.push(
            ExtractionError::new(
                entry.line_number,
                ErrorType::NumberingSequenceError,
                format!("{label} numbering out of sequence"),
                &context_of(entry),
            )
            .with_expected_found(expected.clone(), found.clone()),
        );
    }

    successor(level_type, &found).or_else(|| successor(level_type, &expected))
}

fn check_synthetic(entry: &Entry, label: &str, errors: &mut ErrorLog) {
    if !entry.is_synthetic_parent() {
        return;
    }

    errors.push(ExtractionError::new(
        entry.line_number,
        ErrorType::StructureError,
        format!(
            "{label} {} was synthesized to hold entries found without a parent",
            entry.number
        ),
        &context_of(entry),
    ));
}

fn context_of(entry: &Entry) -> String {
    if entry.source_text.trim().is_empty() {
        format!("{} {}", entry.number, entry.text).trim().to_string()
    } else {
        entry.source_text.clone()
    }
}
