fn main() {
    println!("polydose-rs - Polyploid Allele Dosage Inference");
    println!();
    println!("Tools:");
    println!("  dosage     - Infer the dosage of one marker from its ref/alt read counts");
    println!("  depth_sim  - Simulate dosage accuracy across sequencing depths (default)");
    println!();
    println!("For help with each tool:");
    println!("  cargo run --bin dosage -- --help");
    println!("  cargo run --bin depth_sim -- --help");
    println!();
    println!("Quick start examples:");
    println!("  cargo run --bin dosage -- --ref 1 --alt 50 --ploidy 4");
    println!("  cargo run --bin depth_sim -- --ploidy 6 --metric accuracy --output curves.tsv");
}
