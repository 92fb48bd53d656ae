mod bar;
mod pipeline;
mod queue;
mod sim;
mod tool;
mod types;

fn parse_u64_list(arg: &str) -> Option<Vec<u64>> {
    if arg == "-" {
        return None;
    }
    let mut values = Vec::new();
    for part in arg.split(',') {
        if part.trim().is_empty() {
            return None;
        }
        let value = part.trim().parse::<u64>().ok()?;
        values.push(value);
    }
    Some(values)
}

fn parse_usize_list(arg: &str) -> Option<Vec<usize>> {
    if arg == "-" {
        return None;
    }
    let mut values = Vec::new();
    for part in arg.split(',') {
        if part.trim().is_empty() {
            return None;
        }
        let value = part.trim().parse::<usize>().ok()?;
        values.push(value);
    }
    Some(values)
}

fn print_usage(program: &str) {
    println!("Burger Bar CLI");
    println!("Usage:");
    println!("  {program} (run demo)");
    println!("  {program} bench [customers] [capacity] [grill_us] [eat_ms] [validate]");
    println!("  {program} stress [customer_sets] [capacity_sets] [grill_us] [eat_ms] [validate]");
    println!("  {program} --help");
    println!();
    println!("Sets are comma-separated lists (e.g., 8,16,32). Use \"-\" to keep defaults for customer/capacity sets.");
    println!("Omit grill_us/eat_ms to keep their defaults.");
    println!("Defaults:");
    println!("  bench  customers=50 capacity=4 grill_us=1000 eat_ms=1");
    println!("  stress customers=8,16,32 capacity=1,2,4,8 grill_us=1000 eat_ms=1");
    println!("Flags:");
    println!("  validate  enable extra safety checks");
}

fn exit_with_usage(program: &str, message: &str) -> ! {
    eprintln!("{message}");
    print_usage(program);
    std::process::exit(2);
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "burger_bar".to_string());
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("bench") => {
            let customers = args.next().and_then(|v| v.parse::<u64>().ok());
            let capacity = args.next().and_then(|v| v.parse::<usize>().ok());
            let grill_us = args.next().and_then(|v| v.parse::<u64>().ok());
            let eat_ms = args.next().and_then(|v| v.parse::<u64>().ok());
            let mut validate = false;
            for arg in args {
                if arg.as_str() == "validate" {
                    validate = true;
                }
            }
            sim::run_benchmark(customers, capacity, grill_us, eat_ms, validate);
        }
        Some("stress") => {
            let mut customer_sets: Option<Vec<u64>> = None;
            let mut capacity_sets: Option<Vec<usize>> = None;
            let mut grill_us: Option<u64> = None;
            let mut eat_ms: Option<u64> = None;
            let mut customer_sets_skipped = false;
            let mut capacity_sets_skipped = false;
            let mut validate = false;

            for arg in args {
                if arg.as_str() == "validate" {
                    validate = true;
                    continue;
                }

                if customer_sets.is_none() && !customer_sets_skipped {
                    if arg == "-" {
                        customer_sets_skipped = true;
                    } else if let Some(values) = parse_u64_list(&arg) {
                        customer_sets = Some(values);
                    } else {
                        exit_with_usage(
                            &program,
                            &format!("stress: invalid customer_sets value: {arg}"),
                        );
                    }
                    continue;
                }
                if capacity_sets.is_none() && !capacity_sets_skipped {
                    if arg == "-" {
                        capacity_sets_skipped = true;
                    } else if let Some(values) = parse_usize_list(&arg) {
                        capacity_sets = Some(values);
                    } else {
                        exit_with_usage(
                            &program,
                            &format!("stress: invalid capacity_sets value: {arg}"),
                        );
                    }
                    continue;
                }
                if grill_us.is_none() {
                    if let Ok(value) = arg.parse::<u64>() {
                        grill_us = Some(value);
                    } else {
                        exit_with_usage(&program, &format!("stress: invalid grill_us value: {arg}"));
                    }
                    continue;
                }
                if eat_ms.is_none() {
                    if let Ok(value) = arg.parse::<u64>() {
                        eat_ms = Some(value);
                    } else {
                        exit_with_usage(&program, &format!("stress: invalid eat_ms value: {arg}"));
                    }
                    continue;
                }

                exit_with_usage(&program, &format!("stress: unexpected argument: {arg}"));
            }

            sim::run_stress(customer_sets, capacity_sets, grill_us, eat_ms, validate);
        }
        Some("--help") | Some("-h") | Some("help") => print_usage(&program),
        Some(other) => {
            exit_with_usage(&program, &format!("unknown command: {other}"));
        }
        None => sim::run_demo(),
    }
}
