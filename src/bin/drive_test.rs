// Drive test: careful, step-by-step factory test for a JetBot base
//
// IMPORTANT: Run pwm_diagnostic FIRST to verify read-only communication.
//
// Safety features:
// - Explicit confirmation before any writes
// - Slow test speed
// - The base is stopped between steps and on drop

use std::io::{self, Write};
use std::thread::sleep;
use std::time::Duration;

use clap::Parser;

use jetdrive::bus::{DEFAULT_I2C_ADDR, LinuxI2cBus};
use jetdrive::robot::JetBot;

const TEST_SPEED: f32 = 0.5;

#[derive(Parser)]
#[command(about = "Factory drive test for a JetBot base (WITH WRITES)")]
struct Args {
    /// I2C bus number (/dev/i2c-N)
    #[arg(long, default_value_t = 1)]
    bus: u8,

    /// 7-bit device address
    #[arg(long, default_value_t = DEFAULT_I2C_ADDR)]
    addr: u16,
}

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush().unwrap();
    let mut input = String::new();
    io::stdin().read_line(&mut input).unwrap();
    input.trim().eq_ignore_ascii_case("y")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    println!("This tool WILL drive the motors and cause movement!");
    println!("Make sure the wheels are OFF THE GROUND before proceeding.");
    println!();

    if !confirm("Have you run pwm_diagnostic first and verified the chip responds?") {
        println!("Please run: cargo run --bin pwm_diagnostic");
        return Ok(());
    }
    if !confirm("Are the robot's wheels OFF THE GROUND?") {
        println!("Please elevate the robot so the wheels can spin freely.");
        return Ok(());
    }

    println!();
    println!("Opening bus and loading calibration...");
    let bus = LinuxI2cBus::open(args.bus, args.addr)?;
    let mut bot = JetBot::new(bus)?;
    println!("Test starts in 5 seconds...");
    sleep(Duration::from_secs(5));

    println!("going forward...");
    bot.forward(TEST_SPEED)?;
    sleep(Duration::from_secs(1));

    println!("going backward...");
    bot.backward(TEST_SPEED)?;
    sleep(Duration::from_secs(1));

    println!("going leftward...");
    bot.left(TEST_SPEED)?;
    sleep(Duration::from_secs(1));

    println!("going rightward...");
    bot.right(TEST_SPEED)?;
    sleep(Duration::from_secs(1));

    bot.stop()?;
    println!("Test done.");
    Ok(())
}
