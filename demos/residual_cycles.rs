//! Pairwise netting never routes debt through a third member, so a
//! round of lunches bought in a circle survives as three transfers.
//! This example shows the cycle diagnostic that points them out.

use expense_ledger::graph::cycles::{cyclic_components, find_residual_cycles};
use expense_ledger::prelude::*;
use expense_ledger::service::net_snapshot;
use rust_decimal_macros::dec;

fn main() -> Result<(), LedgerError> {
    println!("╔═════════════════════════════════════════╗");
    println!("║  expense-ledger: Residual Cycle Example ║");
    println!("╚═════════════════════════════════════════╝\n");

    let facts = InMemoryFacts::new();
    let office = GroupId::new("lunch-club");
    facts.create_group(office.clone())?;
    for (id, name) in [("ines", "Ines"), ("jon", "Jon"), ("kai", "Kai")] {
        facts.add_member(&office, Member::new(id, name))?;
    }
    let service = LedgerService::new(facts);

    println!("Lunches:");
    println!("  Jon buys Ines lunch:  15");
    println!("  Kai buys Jon lunch:   12");
    println!("  Ines buys Kai lunch:  20\n");

    for (payer, guest, amount) in [
        ("jon", "ines", dec!(15)),
        ("kai", "jon", dec!(12)),
        ("ines", "kai", dec!(20)),
    ] {
        service.record_expense(
            &office,
            MemberId::new(payer),
            amount,
            "lunch",
            "Food",
            &SplitInput::custom(vec![(MemberId::new(guest), amount)]),
        )?;
    }

    let snapshot = service.store().snapshot(&office)?;
    let netting = net_snapshot(&snapshot, service.config());
    println!("{}", netting);

    let cycles = find_residual_cycles(netting.transfers());
    println!("Residual cycles: {}\n", cycles.len());
    for cycle in &cycles {
        let path: Vec<&str> = cycle.members.iter().map(MemberId::as_str).collect();
        println!("  {} → {}", path.join(" → "), path[0]);
        println!("    Bottleneck:        {}", cycle.bottleneck);
        println!("    Potential savings: {}", cycle.potential_savings());
    }

    for component in cyclic_components(netting.transfers()) {
        let names: Vec<&str> = component.iter().map(MemberId::as_str).collect();
        println!("\nMembers that owe each other in a loop: {}", names.join(", "));
    }

    Ok(())
}
