//! Whole-stream mnemonic histogram, vector and scalar alike.
//!
//! Useful when the RVV numbers look suspicious: it shows what the binary is
//! actually made of.

use std::collections::BTreeMap;
use std::fmt;

use crate::classifier;
use crate::format::{share, thousands};
use crate::parser::DisassemblyParser;

/// Default number of mnemonics listed by [`Census::render`]
pub const DEFAULT_TOP_N: usize = 50;

const SCALAR_LOADS: &[&str] = &["ld", "lw", "lh", "lb", "lbu", "lhu", "lwu"];
const SCALAR_STORES: &[&str] = &["sd", "sw", "sh", "sb"];
const SCALAR_ARITHMETIC: &[&str] = &["add", "addi", "sub", "mul", "div", "rem"];

/// Coarse instruction categories reported by the census
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Rvv,
    ScalarLoad,
    ScalarStore,
    ScalarArithmetic,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Rvv,
            Category::ScalarLoad,
            Category::ScalarStore,
            Category::ScalarArithmetic,
        ]
    }

    /// Whether `mnemonic` falls in this category
    pub fn contains(&self, mnemonic: &str) -> bool {
        match self {
            Category::Rvv => classifier::is_target_instruction(mnemonic),
            Category::ScalarLoad => SCALAR_LOADS.contains(&mnemonic),
            Category::ScalarStore => SCALAR_STORES.contains(&mnemonic),
            Category::ScalarArithmetic => SCALAR_ARITHMETIC.contains(&mnemonic),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Rvv => write!(f, "RVV instructions"),
            Category::ScalarLoad => write!(f, "Scalar Load"),
            Category::ScalarStore => write!(f, "Scalar Store"),
            Category::ScalarArithmetic => write!(f, "Scalar Arithmetic"),
        }
    }
}

/// Occurrences of every mnemonic in a disassembly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Census {
    pub total: usize,
    pub counts: BTreeMap<String, usize>,
}

impl Census {
    /// Count every instruction line of `text`
    pub fn from_disassembly(text: &str) -> Self {
        let mut counts = BTreeMap::new();
        let total = DisassemblyParser::new().for_each_instruction(text, |record| {
            *counts.entry(record.mnemonic.to_string()).or_insert(0) += 1;
        });
        Census { total, counts }
    }

    /// Mnemonics by descending count, ties by name
    pub fn sorted(&self) -> Vec<(&str, usize)> {
        let mut sorted: Vec<(&str, usize)> =
            self.counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
    }

    /// Occurrences per category
    pub fn category_count(&self, category: Category) -> usize {
        self.counts
            .iter()
            .filter(|(mnemonic, _)| category.contains(mnemonic))
            .map(|(_, count)| count)
            .sum()
    }

    /// Top-`top_n` table followed by the category breakdown
    pub fn render(&self, top_n: usize) -> String {
        let mut out = format!("Total instructions: {}\n\n", thousands(self.total));

        out.push_str(&format!("Top {} most used instructions:\n", top_n));
        out.push_str(&format!("{:<20} {:<15} {:<10}\n", "Instruction", "Count", "Percentage"));
        out.push_str(&format!("{}\n", "-".repeat(50)));
        for (mnemonic, count) in self.sorted().into_iter().take(top_n) {
            out.push_str(&format!(
                "{:<20} {:<15} {:>6.2}%\n",
                mnemonic,
                thousands(count),
                share(count, self.total)
            ));
        }

        let rule = "=".repeat(50);
        out.push_str(&format!("\n{}\nInstruction Categories:\n{}\n", rule, rule));
        for category in Category::all() {
            let count = self.category_count(*category);
            out.push_str(&format!(
                "{:<22} {:>10} ({:>6.2}%)\n",
                format!("{}:", category),
                thousands(count),
                share(count, self.total)
            ));
        }

        out
    }
}
