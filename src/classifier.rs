//! RVV mnemonic classifier backed by a fixed, hand-curated pattern catalog.
//!
//! Every catalog entry is matched at the start of the mnemonic token and must
//! end on a word boundary, so `vadd` accepts `vadd` and `vadd.vv` but not
//! `vaddu`. Suffixed variants only match through their own entries. Mnemonics
//! outside the catalog are scalar.

use std::fmt;

use lazy_static::lazy_static;
use regex::RegexSet;

/// Instruction families of the RISC-V Vector extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InstructionFamily {
    /// Single-width integer add/sub/mul/div/multiply-add
    Arithmetic,
    /// Widening and narrowing integer operations
    WideningNarrowing,
    Shift,
    /// Integer compare into mask
    Compare,
    MinMax,
    Logical,
    /// Unit-stride, strided and indexed loads/stores
    LoadStore,
    /// Vector AMO operations
    Atomic,
    FixedPoint,
    Reduction,
    Mask,
    Permutation,
    MergeMove,
    FloatArithmetic,
    FloatCompare,
    FloatConversion,
    /// vsetvl and friends
    Configuration,
}

impl fmt::Display for InstructionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstructionFamily::Arithmetic => write!(f, "Integer arithmetic"),
            InstructionFamily::WideningNarrowing => write!(f, "Widening/narrowing"),
            InstructionFamily::Shift => write!(f, "Shift"),
            InstructionFamily::Compare => write!(f, "Compare"),
            InstructionFamily::MinMax => write!(f, "Min/max"),
            InstructionFamily::Logical => write!(f, "Logical"),
            InstructionFamily::LoadStore => write!(f, "Load/store"),
            InstructionFamily::Atomic => write!(f, "Atomic"),
            InstructionFamily::FixedPoint => write!(f, "Fixed-point"),
            InstructionFamily::Reduction => write!(f, "Reduction"),
            InstructionFamily::Mask => write!(f, "Mask"),
            InstructionFamily::Permutation => write!(f, "Permutation"),
            InstructionFamily::MergeMove => write!(f, "Merge/move"),
            InstructionFamily::FloatArithmetic => write!(f, "FP arithmetic"),
            InstructionFamily::FloatCompare => write!(f, "FP compare"),
            InstructionFamily::FloatConversion => write!(f, "FP conversion"),
            InstructionFamily::Configuration => write!(f, "Configuration"),
        }
    }
}

use InstructionFamily::*;

/// The mnemonic catalog, in match order.
pub const CATALOG: &[(InstructionFamily, &str)] = &[
    (Arithmetic, r"\bvadd\b"), (Arithmetic, r"\bvsub\b"), (Arithmetic, r"\bvrsub\b"),
    (Arithmetic, r"\bvmul\b"), (Arithmetic, r"\bvmulh\b"), (Arithmetic, r"\bvmulhu\b"),
    (Arithmetic, r"\bvmulhsu\b"),
    (Arithmetic, r"\bvdiv\b"), (Arithmetic, r"\bvdivu\b"), (Arithmetic, r"\bvrem\b"),
    (Arithmetic, r"\bvremu\b"),
    (Arithmetic, r"\bvmadd\b"), (Arithmetic, r"\bvnmsub\b"), (Arithmetic, r"\bvmacc\b"),
    (Arithmetic, r"\bvnmsac\b"),

    (WideningNarrowing, r"\bvwadd\b"), (WideningNarrowing, r"\bvwsub\b"),
    (WideningNarrowing, r"\bvwmul\b"), (WideningNarrowing, r"\bvwmulu\b"),
    (WideningNarrowing, r"\bvwmulsu\b"),
    (WideningNarrowing, r"\bvnsra\b"), (WideningNarrowing, r"\bvnsrl\b"),

    (Shift, r"\bvsll\b"), (Shift, r"\bvsrl\b"), (Shift, r"\bvsra\b"),

    (Compare, r"\bvmseq\b"), (Compare, r"\bvmsne\b"), (Compare, r"\bvmsltu\b"),
    (Compare, r"\bvmslt\b"), (Compare, r"\bvmsleu\b"), (Compare, r"\bvmsle\b"),
    (Compare, r"\bvmsgtu\b"), (Compare, r"\bvmsgt\b"),

    (MinMax, r"\bvmin\b"), (MinMax, r"\bvminu\b"), (MinMax, r"\bvmax\b"), (MinMax, r"\bvmaxu\b"),

    (Logical, r"\bvand\b"), (Logical, r"\bvor\b"), (Logical, r"\bvxor\b"), (Logical, r"\bvnot\b"),

    // unit-stride
    (LoadStore, r"\bvle\d+\b"), (LoadStore, r"\bvse\d+\b"),
    // strided
    (LoadStore, r"\bvlse\d+\b"), (LoadStore, r"\bvsse\d+\b"),
    // indexed
    (LoadStore, r"\bvlxe\d+\b"), (LoadStore, r"\bvsxe\d+\b"), (LoadStore, r"\bvsuxe\d+\b"),
    (LoadStore, r"\bvleff\b"), (LoadStore, r"\bvlm\b"), (LoadStore, r"\bvsm\b"),

    (Atomic, r"\bvamoswap\b"), (Atomic, r"\bvamoadd\b"), (Atomic, r"\bvamoxor\b"),
    (Atomic, r"\bvamoand\b"), (Atomic, r"\bvamoor\b"), (Atomic, r"\bvamomin\b"),
    (Atomic, r"\bvamomax\b"), (Atomic, r"\bvamominu\b"), (Atomic, r"\bvamomaxu\b"),

    (FixedPoint, r"\bvsadd\b"), (FixedPoint, r"\bvsaddu\b"), (FixedPoint, r"\bvssub\b"),
    (FixedPoint, r"\bvssubu\b"),
    (FixedPoint, r"\bvaaddu\b"), (FixedPoint, r"\bvaadd\b"), (FixedPoint, r"\bvasubu\b"),
    (FixedPoint, r"\bvasub\b"),
    (FixedPoint, r"\bvsmul\b"), (FixedPoint, r"\bvssra\b"), (FixedPoint, r"\bvssrl\b"),

    (Reduction, r"\bvredsum\b"), (Reduction, r"\bvredand\b"), (Reduction, r"\bvredor\b"),
    (Reduction, r"\bvredxor\b"),
    (Reduction, r"\bvredminu\b"), (Reduction, r"\bvredmin\b"), (Reduction, r"\bvredmaxu\b"),
    (Reduction, r"\bvredmax\b"),
    (Reduction, r"\bvwredsum\b"), (Reduction, r"\bvwredsumu\b"),

    (Mask, r"\bvmand\b"), (Mask, r"\bvmnand\b"), (Mask, r"\bvmandn\b"), (Mask, r"\bvmxor\b"),
    (Mask, r"\bvmor\b"), (Mask, r"\bvmnor\b"), (Mask, r"\bvmorn\b"), (Mask, r"\bvmxnor\b"),
    (Mask, r"\bvpopc\b"), (Mask, r"\bvfirst\b"), (Mask, r"\bvmsbf\b"), (Mask, r"\bvmsif\b"),
    (Mask, r"\bvmsof\b"),
    (Mask, r"\bviota\b"), (Mask, r"\bvid\b"),

    (Permutation, r"\bvslideup\b"), (Permutation, r"\bvslidedown\b"),
    (Permutation, r"\bvslide1up\b"), (Permutation, r"\bvslide1down\b"),
    (Permutation, r"\bvrgather\b"), (Permutation, r"\bvrgatherei16\b"),
    (Permutation, r"\bvcompress\b"),

    (MergeMove, r"\bvmerge\b"), (MergeMove, r"\bvmv\b"),

    (FloatArithmetic, r"\bvfadd\b"), (FloatArithmetic, r"\bvfsub\b"),
    (FloatArithmetic, r"\bvfrsub\b"),
    (FloatArithmetic, r"\bvfmul\b"), (FloatArithmetic, r"\bvfdiv\b"),
    (FloatArithmetic, r"\bvfrdiv\b"),
    (FloatArithmetic, r"\bvfmadd\b"), (FloatArithmetic, r"\bvfnmadd\b"),
    (FloatArithmetic, r"\bvfmsub\b"), (FloatArithmetic, r"\bvfnmsub\b"),
    (FloatArithmetic, r"\bvfmacc\b"), (FloatArithmetic, r"\bvfnmacc\b"),
    (FloatArithmetic, r"\bvfmsac\b"), (FloatArithmetic, r"\bvfnmsac\b"),
    (FloatArithmetic, r"\bvfwadd\b"), (FloatArithmetic, r"\bvfwsub\b"),
    (FloatArithmetic, r"\bvfwmul\b"),
    (FloatArithmetic, r"\bvfsqrt\b"), (FloatArithmetic, r"\bvfrsqrt7\b"),
    (FloatArithmetic, r"\bvfrec7\b"),
    (FloatArithmetic, r"\bvfmin\b"), (FloatArithmetic, r"\bvfmax\b"),
    (FloatArithmetic, r"\bvfsgnj\b"), (FloatArithmetic, r"\bvfsgnjn\b"),
    (FloatArithmetic, r"\bvfsgnjx\b"),
    (FloatArithmetic, r"\bvfclass\b"), (FloatArithmetic, r"\bvfmerge\b"),

    (FloatCompare, r"\bvmfeq\b"), (FloatCompare, r"\bvmfne\b"), (FloatCompare, r"\bvmflt\b"),
    (FloatCompare, r"\bvmfle\b"), (FloatCompare, r"\bvmfgt\b"), (FloatCompare, r"\bvmfge\b"),

    (FloatConversion, r"\bvfcvt\b"), (FloatConversion, r"\bvfwcvt\b"),
    (FloatConversion, r"\bvfncvt\b"),

    (Configuration, r"\bvsetvl\b"), (Configuration, r"\bvsetvli\b"),
    (Configuration, r"\bvsetivli\b"),
];

lazy_static! {
    /// Catalog compiled once, anchored at the token start and case-insensitive.
    static ref CATALOG_SET: RegexSet = RegexSet::new(
        CATALOG.iter().map(|(_, pattern)| format!("(?i)^{}", pattern))
    )
    .expect("RVV catalog patterns are valid regexes");
}

/// Returns true if `mnemonic` is an RVV instruction.
pub fn is_target_instruction(mnemonic: &str) -> bool {
    CATALOG_SET.is_match(mnemonic)
}

/// Family of the first catalog entry matching `mnemonic`.
pub fn family_of(mnemonic: &str) -> Option<InstructionFamily> {
    CATALOG_SET
        .matches(mnemonic)
        .iter()
        .next()
        .map(|idx| CATALOG[idx].0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("vadd")]
    #[case("vsub")]
    #[case("vmul")]
    #[case("vfadd")]
    #[case("vfmul")]
    #[case("vfmacc")]
    #[case("vle8")]
    #[case("vle32")]
    #[case("vse64")]
    #[case("vsetvli")]
    #[case("vsetivli")]
    #[case("vrgatherei16")]
    #[case("vfrsqrt7")]
    #[case("vwredsumu")]
    fn test_catalog_members(#[case] mnemonic: &str) {
        assert!(is_target_instruction(mnemonic));
        assert!(is_target_instruction(&mnemonic.to_uppercase()));
    }

    #[rstest]
    #[case("add")]
    #[case("mul")]
    #[case("ld")]
    #[case("auipc")]
    #[case("addi")]
    #[case("fadd")]
    #[case("")]
    fn test_scalar_mnemonics(#[case] mnemonic: &str) {
        assert!(!is_target_instruction(mnemonic));
        assert_eq!(family_of(mnemonic), None);
    }

    #[test]
    fn test_word_boundary() {
        // No generic prefix rule
        assert!(!is_target_instruction("vaddx"));
        assert!(!is_target_instruction("vle"));
        assert!(!is_target_instruction("vle32ff"));
        assert!(!is_target_instruction("xvadd"));

        // Explicit suffixed entries
        assert!(is_target_instruction("vaaddu"));
        assert!(is_target_instruction("vsaddu"));

        // Operand-type suffixes are not word characters
        assert!(is_target_instruction("vadd.vv"));
        assert!(is_target_instruction("vle32.v"));
    }

    #[test]
    fn test_family_lookup() {
        assert_eq!(family_of("vsetvli"), Some(InstructionFamily::Configuration));
        assert_eq!(family_of("VLE16"), Some(InstructionFamily::LoadStore));
        assert_eq!(family_of("vfwcvt"), Some(InstructionFamily::FloatConversion));
        assert_eq!(family_of("vmfeq"), Some(InstructionFamily::FloatCompare));
        assert_eq!(family_of("vid"), Some(InstructionFamily::Mask));
        assert_eq!(family_of("vmv"), Some(InstructionFamily::MergeMove));
    }

    #[test]
    fn test_catalog_size() {
        assert!(CATALOG.len() >= 140);
        assert_eq!(CATALOG_SET.len(), CATALOG.len());
    }
}
