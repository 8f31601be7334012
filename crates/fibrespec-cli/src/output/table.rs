use fibrespec_core::model::SpecificationOutput;

use crate::commands::extract::FileResult;

pub fn print(results: &[FileResult]) {
    for (i, result) in results.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("=== {} ===\n", result.path.display());

        if result.outputs.is_empty() {
            println!("  No specifications extracted\n");
            continue;
        }

        let counts: Vec<String> = result.outputs[0]
            .metadata
            .detected_fiber_counts
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("  Fibre counts: {}\n", counts.join(", "));

        for out in &result.outputs {
            print_variant(out);
        }
    }
}

fn print_variant(out: &SpecificationOutput) {
    println!("--- {} ---", out.metadata.fiber_type);

    let max_name = out
        .technical_specifications
        .values()
        .flat_map(|params| params.keys())
        .map(|name| name.chars().count())
        .max()
        .unwrap_or(10);

    for (section, params) in &out.technical_specifications {
        println!("  {section}");
        for (name, value) in params {
            println!(
                "    {:<width$}  {}",
                name,
                value,
                width = max_name
            );
        }
    }

    if !out.document_content.is_empty() {
        let blocks: usize = out.document_content.values().map(|b| b.len()).sum();
        println!(
            "  ({} text block(s) across {} page(s))",
            blocks,
            out.document_content.len()
        );
    }
    println!();
}
