pub mod decoder;
pub mod fitness;
pub mod grammar;
pub mod individual;
pub mod population;
pub mod stats;

/// Alias within the crate for the genotype representation: a fixed-length
/// bit string, conceptually partitioned into fixed-width codons.
pub type Genotype = Vec<bool>;

/// Parses a genotype from its literal bit-string form, e.g. `"0010"`.
///
/// # Arguments
/// * `bits` - String of `'0'` and `'1'` characters
///
/// # Returns
/// * `Option<Genotype>` - `None` when any other character is present
pub fn genotype_from_bits(bits: &str) -> Option<Genotype> {
    bits.chars()
        .map(|c| match c {
            '0' => Some(false),
            '1' => Some(true),
            _ => None,
        })
        .collect()
}

/// Renders a genotype as its literal bit-string form.
pub fn genotype_to_bits(genotype: &Genotype) -> String {
    genotype.iter().map(|&b| if b { '1' } else { '0' }).collect()
}
