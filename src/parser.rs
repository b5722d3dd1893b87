//! Line-oriented parser for `objdump -D` text output.

use std::fmt;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::stats::Aggregator;
use crate::{InstructionRecord, UNKNOWN_SECTION};

lazy_static! {
    // "Disassembly of section .text:"
    static ref SECTION_HEADER: Regex =
        Regex::new(r"^Disassembly of section (.+):").expect("valid section header regex");

    // "10000:       02010113                addi    sp,sp,32"
    static ref INSTRUCTION_LINE: Regex =
        Regex::new(r"^\s*[0-9a-f]+:\s+[0-9a-f]+\s+(\w+)").expect("valid instruction regex");
}

/// What a single line of disassembler output turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedLine<'a> {
    /// `Disassembly of section <name>:`
    SectionHeader(&'a str),
    /// An instruction line, carrying its leading mnemonic
    Instruction(&'a str),
    /// Blank lines, banners, labels, symbol tables and other noise
    Skip,
}

/// Classify one line of objdump output.
pub fn parse_line(line: &str) -> ParsedLine<'_> {
    if let Some(caps) = SECTION_HEADER.captures(line) {
        if let Some(name) = caps.get(1) {
            return ParsedLine::SectionHeader(name.as_str());
        }
    }

    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with("file format") {
        return ParsedLine::Skip;
    }

    match INSTRUCTION_LINE.captures(trimmed).and_then(|caps| caps.get(1)) {
        Some(mnemonic) => ParsedLine::Instruction(mnemonic.as_str()),
        None => ParsedLine::Skip,
    }
}

/// Parser for objdump disassembly listings.
///
/// The only state carried across lines is the current section, which lives
/// inside a single parse call. One parser can therefore be shared freely.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisassemblyParser;

impl DisassemblyParser {
    /// Construct a new DisassemblyParser.
    pub fn new() -> Self {
        DisassemblyParser
    }

    /// Walk `text` in one forward pass, handing every instruction to `f`.
    ///
    /// Instructions seen before the first section header are attributed to
    /// [`UNKNOWN_SECTION`]. Returns the number of instructions visited.
    pub fn for_each_instruction<'t, F>(&self, text: &'t str, mut f: F) -> usize
    where
        F: FnMut(InstructionRecord<'t>),
    {
        let mut current_section: &'t str = UNKNOWN_SECTION;
        let mut ordinal = 0;

        for line in text.lines() {
            match parse_line(line) {
                ParsedLine::SectionHeader(name) => {
                    debug!("Entering section {}", name);
                    current_section = name;
                }
                ParsedLine::Instruction(mnemonic) => {
                    ordinal += 1;
                    f(InstructionRecord {
                        mnemonic,
                        section: current_section,
                        ordinal,
                    });
                }
                ParsedLine::Skip => {}
            }
        }

        ordinal
    }

    /// Parse `text` and feed every instruction into `aggregator`.
    pub fn parse(&self, text: &str, aggregator: &mut Aggregator) {
        let count = self.for_each_instruction(text, |record| {
            aggregator.record(record.mnemonic, record.section);
        });
        debug!("Parsed {} instruction lines", count);
    }
}

impl fmt::Display for DisassemblyParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DisassemblyParser")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_section_header() {
        assert_eq!(
            parse_line("Disassembly of section .text:"),
            ParsedLine::SectionHeader(".text")
        );
        assert_eq!(
            parse_line("Disassembly of section .rodata.cst16:"),
            ParsedLine::SectionHeader(".rodata.cst16")
        );
        // Indented headers are not headers
        assert_eq!(parse_line("  Disassembly of section .text:"), ParsedLine::Skip);
    }

    #[test]
    fn test_parse_instruction_lines() {
        assert_eq!(
            parse_line("   10000:       00000517                auipc   a0,0x0"),
            ParsedLine::Instruction("auipc")
        );
        assert_eq!(
            parse_line("   20004:\t02050207          \tvle32.v\tv4,(a0)"),
            ParsedLine::Instruction("vle32")
        );
        assert_eq!(
            parse_line("   2000c:       020282d7                vadd.vv v5,v4,v5"),
            ParsedLine::Instruction("vadd")
        );
        // Compressed 16-bit encoding
        assert_eq!(parse_line("   10a2:\t1141                \taddi\tsp,sp,-16"), ParsedLine::Instruction("addi"));
    }

    #[test]
    fn test_parse_noise_lines() {
        assert_eq!(parse_line(""), ParsedLine::Skip);
        assert_eq!(parse_line("   \t  "), ParsedLine::Skip);
        assert_eq!(parse_line("bird.adx:     file format elf64-littleriscv"), ParsedLine::Skip);
        assert_eq!(parse_line("0000000000010000 <_start>:"), ParsedLine::Skip);
        assert_eq!(parse_line("   20000:\t00000000          \t.word\t0x00000000"), ParsedLine::Skip);
        assert_eq!(parse_line("\t..."), ParsedLine::Skip);
    }

    #[test]
    fn test_sections_are_tracked() {
        let text = "\
   100:  00000517  auipc a0,0x0
Disassembly of section .text:
   10000:  00000517  auipc a0,0x0
Disassembly of section .data:
   20000:  0d007057  vsetvli zero,zero,e32,m2
";
        let mut seen = Vec::new();
        let count = DisassemblyParser::new().for_each_instruction(text, |record| {
            seen.push((record.ordinal, record.mnemonic.to_string(), record.section.to_string()));
        });

        assert_eq!(count, 3);
        assert_eq!(seen, vec![
            (1, "auipc".to_string(), "unknown".to_string()),
            (2, "auipc".to_string(), ".text".to_string()),
            (3, "vsetvli".to_string(), ".data".to_string()),
        ]);
    }

    #[test]
    fn test_section_resets_between_calls() {
        let parser = DisassemblyParser::new();
        parser.for_each_instruction("Disassembly of section .data:\n", |_| {});

        let mut sections = Vec::new();
        parser.for_each_instruction("   10:  00000517  auipc a0,0x0\n", |record| {
            sections.push(record.section.to_string());
        });
        assert_eq!(sections, vec![UNKNOWN_SECTION.to_string()]);
    }
}
