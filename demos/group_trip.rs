//! A weekend trip: record expenses with each split strategy, settle up
//! part of the way, and print who still owes whom.

use expense_ledger::prelude::*;
use rust_decimal_macros::dec;

fn main() -> Result<(), LedgerError> {
    println!("╔═══════════════════════════════════════╗");
    println!("║  expense-ledger: Weekend Trip Example ║");
    println!("╚═══════════════════════════════════════╝\n");

    let facts = InMemoryFacts::new();
    let trip = GroupId::new("porto-weekend");
    facts.create_group(trip.clone())?;
    for (id, name) in [("ana", "Ana"), ("ben", "Ben"), ("cleo", "Cleo"), ("dev", "Dev")] {
        facts.add_member(&trip, Member::new(id, name))?;
    }
    let service = LedgerService::new(facts);

    let ana = MemberId::new("ana");
    let ben = MemberId::new("ben");
    let cleo = MemberId::new("cleo");
    let dev = MemberId::new("dev");

    // --- Expenses ---
    println!("━━━ Expenses ━━━\n");

    let everyone = vec![ana.clone(), ben.clone(), cleo.clone(), dev.clone()];
    let apartment = service.record_expense(
        &trip,
        ana.clone(),
        dec!(320),
        "apartment",
        "Lodging",
        &SplitInput::equal(everyone.clone()),
    )?;
    let dinner = service.record_expense(
        &trip,
        ben.clone(),
        dec!(100),
        "dinner",
        "Food",
        &SplitInput::equal(vec![ana.clone(), ben.clone(), cleo.clone()]),
    )?;
    let boat = service.record_expense(
        &trip,
        cleo.clone(),
        dec!(150),
        "boat tour",
        "Entertainment",
        &SplitInput::percent(vec![
            (ana.clone(), dec!(25)),
            (cleo.clone(), dec!(25)),
            (dev.clone(), dec!(50)),
        ]),
    )?;
    let wine = service.record_expense(
        &trip,
        dev.clone(),
        dec!(84.50),
        "wine cellar",
        "Food",
        &SplitInput::custom(vec![(ben.clone(), dec!(40)), (dev.clone(), dec!(44.50))]),
    )?;

    for expense in [&apartment, &dinner, &boat, &wine] {
        println!(
            "  {:<12} {:>8} paid by {:<5} ({})",
            expense.description(),
            expense.amount(),
            expense.paid_by().as_str(),
            expense.split_strategy()
        );
        for share in expense.shares() {
            println!("      {:<6} {:>8}", share.member.as_str(), share.amount);
        }
    }
    println!();

    // --- Balances ---
    let before = service.calculate_group_balances(&trip)?;
    println!("{}", before);

    // --- Settle up ---
    println!("━━━ Ben pays Ana back 80 ━━━\n");
    let after = service.record_settlement(&trip, ben.clone(), ana.clone(), dec!(80))?;
    println!("{}", after);

    let ben_summary = service.calculate_member_balance(&trip, &ben)?;
    println!(
        "{} now owes {} and is owed {} (net {})",
        ben_summary.member.name,
        ben_summary.total_owed,
        ben_summary.total_owing,
        ben_summary.net_balance
    );

    Ok(())
}
