//! expense-ledger CLI
//!
//! Compute group balances from a JSON snapshot of members, expenses and
//! settlements.
//!
//! # Usage
//!
//! ```bash
//! # Who owes whom
//! expense-ledger balances --input group.json
//!
//! # One member, as JSON
//! expense-ledger member --input group.json --id alice --format json
//!
//! # Preview a split without recording anything
//! expense-ledger split --amount 100 --payer alice --strategy percent \
//!     --participants alice,bob --values alice=60,bob=40
//!
//! # Cycles that pairwise netting leaves behind
//! expense-ledger cycles --input group.json
//!
//! # Generate a random group for testing
//! expense-ledger generate --members 8 --expenses 40
//! ```
//!
//! Set `RUST_LOG=debug` to trace aggregation and netting.

use expense_ledger::core::config::LedgerConfig;
use expense_ledger::core::expense::{Expense, ExpenseSet};
use expense_ledger::core::member::{GroupId, Member, MemberId};
use expense_ledger::core::settlement::Settlement;
use expense_ledger::feed::memory::InMemoryFacts;
use expense_ledger::feed::ports::GroupSnapshot;
use expense_ledger::graph::cycles::{cyclic_components, find_residual_cycles};
use expense_ledger::service::{net_snapshot, LedgerService};
use expense_ledger::simulation::generator::{generate_random_group, GroupConfig};
use expense_ledger::split::calculator::compute_splits;
use expense_ledger::split::strategy::SplitInput;
use log::info;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fs;
use std::process;
use uuid::Uuid;

fn print_usage() {
    eprintln!(
        r#"expense-ledger: group expense splitting and debt netting

USAGE:
    expense-ledger <COMMAND> [OPTIONS]

COMMANDS:
    balances    Show netted transfers and per-member totals for a group
    member      Show one member's totals
    split       Preview how an expense would be split
    cycles      List debt cycles left after pairwise netting
    generate    Generate a random group snapshot (for testing)
    help        Show this message

OPTIONS (balances, member, cycles):
    --input <FILE>        Path to JSON group file
    --format <FORMAT>     Output format: text (default) or json
    --tolerance <DEC>     Override the amount tolerance (default 0.01)
    --id <MEMBER>         Member to show (member only)

OPTIONS (split):
    --amount <DEC>        Expense total
    --payer <MEMBER>      Who paid
    --strategy <NAME>     equal (default), custom or percent
    --participants <LIST> Comma-separated member ids
    --values <LIST>       Comma-separated member=value pairs (custom, percent)

OPTIONS (generate):
    --members <N>         Number of members (default: 6)
    --expenses <N>        Number of expenses (default: 20)
    --settlements <N>     Number of settlements (default: 5)
    --seed <N>            Seed for a reproducible group
    --output <FILE>       Write to file instead of stdout

EXAMPLES:
    expense-ledger balances --input trip.json
    expense-ledger member --input trip.json --id bob --format json
    expense-ledger split --amount 90 --payer a --participants a,b,c
    expense-ledger generate --members 10 --expenses 50 --output test.json"#
    );
}

/// JSON schema for a group file.
#[derive(serde::Deserialize, serde::Serialize)]
struct GroupFile {
    #[serde(default = "default_group")]
    group: String,
    #[serde(default)]
    config: LedgerConfig,
    members: Vec<Member>,
    #[serde(default)]
    expenses: Vec<ExpenseInput>,
    #[serde(default)]
    settlements: Vec<SettlementInput>,
}

fn default_group() -> String {
    "default".to_string()
}

#[derive(serde::Deserialize, serde::Serialize)]
struct ExpenseInput {
    paid_by: String,
    amount: Decimal,
    split: SplitInput,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: String,
    /// Members whose share has already been paid back.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    settled: Vec<String>,
}

#[derive(serde::Deserialize, serde::Serialize)]
struct SettlementInput {
    from: String,
    to: String,
    amount: Decimal,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(format!("serializing output: {}", e)),
    }
}

/// Parse `--flag value` pairs into a map.
fn parse_flags(args: &[String], allowed: &[&str]) -> HashMap<String, String> {
    let mut flags = HashMap::new();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if !allowed.contains(&flag) {
            fail(format!("unknown option: {}", flag));
        }
        i += 1;
        let value = args
            .get(i)
            .cloned()
            .unwrap_or_else(|| fail(format!("{} requires a value", flag)));
        flags.insert(flag.trim_start_matches("--").to_string(), value);
        i += 1;
    }
    flags
}

fn parse_decimal(name: &str, raw: &str) -> Decimal {
    raw.parse()
        .unwrap_or_else(|e| fail(format!("invalid {} '{}': {}", name, raw, e)))
}

fn load_group(flags: &HashMap<String, String>) -> (GroupId, GroupSnapshot, LedgerConfig) {
    let path = flags
        .get("input")
        .unwrap_or_else(|| fail("--input <FILE> is required"));
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("reading file '{}': {}", path, e)));
    let file: GroupFile = serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "group": "trip",
  "members": [ {{ "id": "a", "name": "Alice" }}, {{ "id": "b", "name": "Bob" }} ],
  "expenses": [
    {{
      "paid_by": "a",
      "amount": "90",
      "split": {{ "strategy": "equal", "participants": ["a", "b"] }}
    }}
  ],
  "settlements": [ {{ "from": "b", "to": "a", "amount": "10" }} ]
}}"#
        );
        fail(format!("parsing JSON: {}", e))
    });

    let mut config = file.config;
    if let Some(raw) = flags.get("tolerance") {
        config.tolerance = parse_decimal("tolerance", raw);
    }
    if let Err(e) = config.validate() {
        fail(e);
    }

    let group = GroupId::new(file.group);
    let mut snapshot = GroupSnapshot {
        members: file.members,
        ..Default::default()
    };

    for (i, input) in file.expenses.into_iter().enumerate() {
        let mut expense = Expense::create(
            group.clone(),
            MemberId::new(input.paid_by),
            input.amount,
            &input.split,
            &config,
        )
        .unwrap_or_else(|e| fail(format!("expense #{}: {}", i, e)))
        .with_description(input.description)
        .with_category(input.category);
        for member in &input.settled {
            if !expense.mark_settled(&MemberId::new(member.as_str())) {
                fail(format!("expense #{}: {} has no share to settle", i, member));
            }
        }
        snapshot.expenses.push(expense);
    }

    for (i, input) in file.settlements.into_iter().enumerate() {
        let settlement = Settlement::new(
            group.clone(),
            MemberId::new(input.from),
            MemberId::new(input.to),
            input.amount,
        )
        .unwrap_or_else(|e| fail(format!("settlement #{}: {}", i, e)));
        snapshot.settlements.push(settlement);
    }

    info!(
        "loaded group {}: {} members, {} expenses, {} settlements",
        group,
        snapshot.members.len(),
        snapshot.expenses.len(),
        snapshot.settlements.len()
    );
    (group, snapshot, config)
}

fn service_for(
    group: &GroupId,
    snapshot: GroupSnapshot,
    config: LedgerConfig,
) -> LedgerService<InMemoryFacts> {
    let facts = InMemoryFacts::from_snapshot(group.clone(), snapshot);
    LedgerService::with_config(facts, config).unwrap_or_else(|e| fail(e))
}

fn cmd_balances(args: &[String]) {
    let flags = parse_flags(args, &["--input", "--format", "--tolerance"]);
    let (group, snapshot, config) = load_group(&flags);
    let netting = net_snapshot(&snapshot, &config);
    let expenses: ExpenseSet = snapshot.expenses.iter().cloned().collect();
    let service = service_for(&group, snapshot, config);
    let summary = service
        .calculate_group_balances(&group)
        .unwrap_or_else(|e| fail(e));

    if flags.get("format").map(String::as_str) == Some("json") {
        print_json(&summary);
    } else {
        println!(
            "{} expenses totalling {}\n",
            expenses.len(),
            expenses.gross_total()
        );
        println!("{}", summary);
        println!("{}", netting);
    }
}

fn cmd_member(args: &[String]) {
    let flags = parse_flags(args, &["--input", "--format", "--tolerance", "--id"]);
    let member = MemberId::new(
        flags
            .get("id")
            .cloned()
            .unwrap_or_else(|| fail("--id <MEMBER> is required")),
    );
    let (group, snapshot, config) = load_group(&flags);
    let service = service_for(&group, snapshot, config);
    let balance = service
        .calculate_member_balance(&group, &member)
        .unwrap_or_else(|e| fail(e));

    if flags.get("format").map(String::as_str) == Some("json") {
        print_json(&balance);
    } else {
        println!("{}", balance.member);
        println!("  Owes:     {}", balance.total_owed);
        println!("  Is owed:  {}", balance.total_owing);
        println!("  Net:      {}", balance.net_balance);
    }
}

fn cmd_split(args: &[String]) {
    let flags = parse_flags(
        args,
        &[
            "--amount",
            "--payer",
            "--strategy",
            "--participants",
            "--values",
            "--format",
        ],
    );
    let amount = parse_decimal(
        "amount",
        flags
            .get("amount")
            .unwrap_or_else(|| fail("--amount <DEC> is required")),
    );
    let payer = MemberId::new(
        flags
            .get("payer")
            .cloned()
            .unwrap_or_else(|| fail("--payer <MEMBER> is required")),
    );
    let participants: Vec<MemberId> = flags
        .get("participants")
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(MemberId::new)
                .collect()
        })
        .unwrap_or_default();

    let mut values = HashMap::new();
    if let Some(list) = flags.get("values") {
        for pair in list.split(',').filter(|s| !s.trim().is_empty()) {
            let (member, raw) = pair
                .split_once('=')
                .unwrap_or_else(|| fail(format!("expected member=value, got '{}'", pair)));
            values.insert(MemberId::new(member.trim()), parse_decimal("value", raw.trim()));
        }
    }

    let strategy = flags.get("strategy").map(String::as_str).unwrap_or("equal");
    let input =
        SplitInput::from_parts(strategy, &participants, &values).unwrap_or_else(|e| fail(e));
    let shares = compute_splits(Uuid::new_v4(), amount, &payer, &input, &LedgerConfig::default())
        .unwrap_or_else(|e| fail(e));

    if flags.get("format").map(String::as_str) == Some("json") {
        print_json(&shares);
    } else {
        println!("{} split of {} paid by {}:", input.strategy(), amount, payer);
        for share in &shares {
            println!(
                "  {:<15} {:>12} {:>9}%{}",
                share.member.as_str(),
                share.amount,
                share.percent,
                if share.settled { "  (payer)" } else { "" }
            );
        }
    }
}

fn cmd_cycles(args: &[String]) {
    let flags = parse_flags(args, &["--input", "--format", "--tolerance"]);
    let (_, snapshot, config) = load_group(&flags);
    let netting = net_snapshot(&snapshot, &config);
    let cycles = find_residual_cycles(netting.transfers());

    if flags.get("format").map(String::as_str) == Some("json") {
        print_json(&cycles);
        return;
    }

    if cycles.is_empty() {
        println!("No cycles detected.");
        return;
    }
    for (i, cycle) in cycles.iter().enumerate() {
        let members: Vec<&str> = cycle.members.iter().map(MemberId::as_str).collect();
        println!("  Cycle {}: {} → (back to start)", i, members.join(" → "));
        println!("    Bottleneck:        {}", cycle.bottleneck);
        println!("    Potential savings: {}", cycle.potential_savings());
    }
    println!("\nTotal cycles: {}", cycles.len());
    for component in cyclic_components(netting.transfers()) {
        let members: Vec<&str> = component.iter().map(MemberId::as_str).collect();
        println!("Strongly connected: {}", members.join(", "));
    }
}

fn cmd_generate(args: &[String]) {
    let flags = parse_flags(
        args,
        &["--members", "--expenses", "--settlements", "--seed", "--output"],
    );
    let count = |name: &str, default: usize| -> usize {
        flags
            .get(name)
            .map(|raw| {
                raw.parse()
                    .unwrap_or_else(|_| fail(format!("--{} requires a number", name)))
            })
            .unwrap_or(default)
    };

    let config = GroupConfig {
        member_count: count("members", 6),
        expense_count: count("expenses", 20),
        settlement_count: count("settlements", 5),
        seed: flags.get("seed").map(|raw| {
            raw.parse()
                .unwrap_or_else(|_| fail("--seed requires a number"))
        }),
        ..Default::default()
    };
    let snapshot = generate_random_group(&config);

    let file = GroupFile {
        group: config.group_id.to_string(),
        config: LedgerConfig::default(),
        members: snapshot.members.clone(),
        expenses: snapshot
            .expenses
            .iter()
            .map(|e| ExpenseInput {
                paid_by: e.paid_by().to_string(),
                amount: e.amount(),
                split: SplitInput::custom(
                    e.shares()
                        .iter()
                        .map(|s| (s.member.clone(), s.amount))
                        .collect(),
                ),
                description: e.description().to_string(),
                category: e.category().to_string(),
                settled: Vec::new(),
            })
            .collect(),
        settlements: snapshot
            .settlements
            .iter()
            .map(|s| SettlementInput {
                from: s.from().to_string(),
                to: s.to().to_string(),
                amount: s.amount(),
            })
            .collect(),
    };

    let json = serde_json::to_string_pretty(&file)
        .unwrap_or_else(|e| fail(format!("serializing output: {}", e)));
    if let Some(path) = flags.get("output") {
        fs::write(path, &json).unwrap_or_else(|e| fail(format!("writing to '{}': {}", path, e)));
        eprintln!(
            "Generated {} expenses and {} settlements across {} members → {}",
            file.expenses.len(),
            file.settlements.len(),
            file.members.len(),
            path
        );
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "balances" => cmd_balances(rest),
        "member" => cmd_member(rest),
        "split" => cmd_split(rest),
        "cycles" => cmd_cycles(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
