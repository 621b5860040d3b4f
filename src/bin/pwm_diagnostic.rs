// PWM diagnostic: READ-ONLY check of the controller state
//
// This tool does NOT write to the chip - it attaches without resetting
// and dumps MODE1, the prescale register, and all 16 duty cycles.
//
// Usage: cargo run --bin pwm_diagnostic -- [--bus 1] [--addr 64]

use clap::Parser;

use jetdrive::bus::{DEFAULT_I2C_ADDR, I2cBus, LinuxI2cBus};
use jetdrive::pwm::Pca9685;
use jetdrive::pwm::pca9685::{
    CHANNEL_COUNT, MODE1, MODE1_AUTO_INCREMENT, MODE1_SLEEP, PRESCALE, REF_CLOCK_HZ,
};

#[derive(Parser)]
#[command(about = "Read-only PCA9685 state dump")]
struct Args {
    /// I2C bus number (/dev/i2c-N)
    #[arg(long, default_value_t = 1)]
    bus: u8,

    /// 7-bit device address
    #[arg(long, default_value_t = DEFAULT_I2C_ADDR)]
    addr: u16,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    println!(
        "Opening /dev/i2c-{} at address 0x{:02X} (read-only)...",
        args.bus, args.addr
    );
    let mut bus = LinuxI2cBus::open(args.bus, args.addr)?;

    let mode1 = bus.read_block(MODE1, 1)?[0];
    let prescale = bus.read_block(PRESCALE, 1)?[0];
    println!("MODE1    = 0x{:02X}", mode1);
    println!("  sleep          : {}", mode1 & MODE1_SLEEP != 0);
    println!("  auto-increment : {}", mode1 & MODE1_AUTO_INCREMENT != 0);
    println!("PRESCALE = {}", prescale);
    if prescale > 0 {
        let freq = REF_CLOCK_HZ as f64 / 4096.0 / prescale as f64;
        println!("  ~{:.1} Hz output", freq);
    }
    println!();

    // Attach without resetting so the dump doesn't disturb the chip
    let mut pca = Pca9685::attach(bus);
    println!("Channel duty cycles:");
    for channel in 0..CHANNEL_COUNT {
        let duty = pca.get_duty_cycle(channel)?;
        println!("  ch {:2}: {:.4}", channel, duty);
    }

    Ok(())
}
