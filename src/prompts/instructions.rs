//! Instruction templates sent to the LLM provider.
//!
//! Every instruction asks for a single Python-style list of quoted strings,
//! which is the shape [`crate::utils::extract_list`] is tuned for.

/// Instruction for a batch of text questions at one complexity/relevance pairing.
pub fn text_question_instruction(
    theme: &str,
    batch_size: usize,
    complexity: u32,
    relevance: u32,
    levels: u32,
) -> String {
    format!(
        "Generate a python-formatted list of {batch_size} questions or instruct tasks related to \
         the theme '{theme}', each with a complexity level of {complexity} out of {levels} and a \
         relevance level to the theme of {relevance} out of {levels}. These tasks should varyingly \
         explore {theme} in a manner that is consistent with their assigned complexity and \
         relevance levels to the theme, allowing for a diverse and insightful engagement about \
         {theme}. Format the questions as comma-separated, quote-encapsulated strings in a single \
         Python list."
    )
}

/// Instruction for a batch of image-generation scenarios.
pub fn image_scenario_instruction(theme: &str, batch_size: usize) -> String {
    format!(
        "Provide a python-formatted list of {batch_size} creative and detailed scenarios for image \
         generation, each inspired by the theme '{theme}'. The scenarios should be diverse, \
         thoughtful, and possibly out-of-the-box interpretations related to '{theme}'. Each \
         element in the list should be a concise, but a vividly descriptive situation designed to \
         inspire visually rich stories. Format these elements as comma-separated, \
         quote-encapsulated strings in a single Python list."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_instruction_interpolates_levels() {
        let instruction = text_question_instruction("Space and the cosmos", 10, 3, 17, 20);
        assert!(instruction.contains("list of 10 questions"));
        assert!(instruction.contains("complexity level of 3 out of 20"));
        assert!(instruction.contains("relevance level to the theme of 17 out of 20"));
        assert!(instruction.contains("'Space and the cosmos'"));
    }

    #[test]
    fn test_image_instruction_interpolates_theme() {
        let instruction = image_scenario_instruction("Neon Nights", 20);
        assert!(instruction.starts_with("Provide a python-formatted list of 20"));
        assert_eq!(instruction.matches("'Neon Nights'").count(), 2);
    }
}
