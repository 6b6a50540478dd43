use crate::cli::InfoArgs;
use crate::error::Result;
use orbvis::core::models::orbital::Spin;
use orbvis::workflows::inspect;
use tracing::info;

pub fn run(args: InfoArgs) -> Result<()> {
    info!("Inspecting {:?}", &args.input);
    let summary = inspect::run(&args.input, args.format.map(Into::into))?;

    println!("File:     {}", args.input.display());
    println!("Format:   {:?}", summary.format);
    println!("Atoms:    {}", summary.atoms);
    println!("Bonds:    {}", summary.bonds);
    if summary.has_field {
        println!("Grid:     pre-sampled volumetric field present");
    }

    if summary.orbitals.is_empty() {
        println!("No molecular orbitals in this file.");
    } else {
        println!("Orbitals: {}", summary.orbitals.len());
        println!();
        println!("{:>5}  {:>12}  {:>8}  {:<5}  {}", "index", "energy", "occup", "spin", "label");
        for orbital in &summary.orbitals {
            let marker = if Some(orbital.index) == summary.homo {
                "  (HOMO)"
            } else if Some(orbital.index) == summary.lumo {
                "  (LUMO)"
            } else {
                ""
            };
            println!(
                "{:>5}  {:>12.6}  {:>8.4}  {:<5}  {}{}",
                orbital.index,
                orbital.energy,
                orbital.occupation,
                spin_label(orbital.spin),
                orbital.label,
                marker,
            );
        }
    }
    Ok(())
}

fn spin_label(spin: Spin) -> &'static str {
    match spin {
        Spin::Alpha => "alpha",
        Spin::Beta => "beta",
    }
}
