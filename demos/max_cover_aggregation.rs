//! Max-Cover aggregation example
//!
//! This example packs a small pool of committee votes with both strategies,
//! then shows a round cap and an expired deadline.
//!
//! Run with: `RUST_LOG=debug cargo run --example max_cover_aggregation`

use att_agg::{
    AggregationConfig, AggregationError, AggregationStrategy, Attestation, AttestationData,
    Bitfield, Bitlist, aggregate, aggregate_with,
};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Stand-in for BLS signature aggregation
fn combine(signatures: &[&[u8]]) -> Result<Vec<u8>, AggregationError> {
    Ok(signatures.concat())
}

fn vote(bits: &str, signer: u8) -> Attestation {
    Attestation::new(
        bits.parse::<Bitlist>().expect("valid bit string"),
        AttestationData::default(),
        vec![signer],
    )
}

fn print_result(label: &str, packed: &[Attestation]) {
    let covered: usize = packed
        .iter()
        .map(|att| att.aggregation_bits.count_ones())
        .sum();
    println!("   {label}: {} attestation(s), {covered} validators", packed.len());
    for att in packed {
        println!(
            "     {}  signature={}",
            att.aggregation_bits,
            hex::encode(&att.signature)
        );
    }
}

fn main() -> Result<(), AggregationError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Max-Cover Aggregation Example ===\n");

    let pool = vec![
        vote("1111000000000000", 0x01),
        vote("0011110000000000", 0x02),
        vote("0000111100000000", 0x03),
        vote("0000000011000000", 0x04),
        vote("0000000000110000", 0x05),
        vote("0000000011110000", 0x06),
        vote("0000000000001111", 0x07),
    ];
    println!("1. Pool of {} votes", pool.len());
    print_result("input", &pool);
    println!();

    println!("2. MaxCover (one output per round)...");
    let packed = aggregate(pool.clone(), &AggregationConfig::default(), &combine)?;
    print_result("output", &packed);
    println!();

    println!("3. MaxCoverCombined (single aggregate)...");
    let config = AggregationConfig::new(AggregationStrategy::MaxCoverCombined);
    let packed = aggregate(pool.clone(), &config, &combine)?;
    print_result("output", &packed);
    println!();

    println!("4. Round cap of 2...");
    let config = AggregationConfig::default().with_max_rounds(2);
    let packed = aggregate(pool.clone(), &config, &combine)?;
    print_result("output", &packed);
    println!();

    println!("5. Expired deadline...");
    let packed = aggregate_with(pool, &AggregationConfig::default(), &combine, &Instant::now())?;
    print_result("output", &packed);
    println!();

    println!("=== Done ===");
    Ok(())
}
