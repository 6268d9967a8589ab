//! Renders a small scene and prints it as ASCII art, optionally saves it as a PPM image
use paintcore::*;
use std::{
    env,
    fs::File,
    io::{BufWriter, Write},
};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

type Error = Box<dyn std::error::Error>;

const WIDTH: usize = 96;
const HEIGHT: usize = 48;

fn draw(canvas: &mut Canvas<'_>) {
    canvas.clear_all(RGBA::new(255, 255, 255, 255));

    // background panel
    canvas
        .fill_linear_gradient(
            (0.0, 0.0),
            (0.0, HEIGHT as Scalar),
            RGBA::new(230, 230, 255, 255),
            RGBA::new(180, 180, 220, 255),
            RGBA::new(120, 120, 180, 255),
        )
        .line_color(RGBA::new(20, 20, 60, 255))
        .line_width(1.0)
        .rounded_rect((2.0, 2.0), (WIDTH as Scalar - 2.0, HEIGHT as Scalar - 2.0), 6.0)
        .draw_path(DrawPathFlag::FillAndStroke);

    // star with a hole
    canvas
        .reset_path()
        .fill_even_odd(true)
        .fill_radial_gradient_stops(
            (24.0, 24.0),
            18.0,
            RGBA::new(255, 240, 0, 255),
            RGBA::new(200, 60, 0, 255),
            0.8,
        )
        .star((24.0, 24.0), 8.0, 18.0, PI / 2.0, 5)
        .ellipse((24.0, 24.0), 4.0, 4.0)
        .draw_path(DrawPathFlag::FillAndStroke);

    // rotated translucent square
    canvas
        .reset_path()
        .fill_even_odd(false)
        .translate(64.0, 24.0)
        .rotate(PI / 6.0)
        .fill_color(RGBA::new(0, 120, 255, 160))
        .line_join(LineJoin::Miter(DEFAULT_MITER_LIMIT))
        .line_width(2.0)
        .rectangle((-12.0, -12.0), (12.0, 12.0))
        .draw_path(DrawPathFlag::FillAndStroke)
        .reset_transformations();

    // multiply a wavy stroke over everything
    canvas
        .reset_path()
        .blend_mode(BlendMode::Multiply)
        .line_color(RGBA::new(255, 0, 128, 255))
        .line_width(3.0)
        .line_cap(LineCap::Round)
        .move_to((6.0, 40.0))
        .curve4((30.0, 20.0), (60.0, 60.0), (90.0, 36.0))
        .draw_path(DrawPathFlag::StrokeOnly)
        .blend_mode(BlendMode::SrcOver);
}

/// Map pixel luminance to a character
fn ascii(pixel: PremulRGBA) -> char {
    const RAMP: &[u8] = b"@%#*+=-:. ";
    let color = pixel.unmultiply();
    let luma = (color.red() as u32 * 299 + color.green() as u32 * 587 + color.blue() as u32 * 114)
        / 1000;
    RAMP[(luma as usize * (RAMP.len() - 1)) / 255] as char
}

fn write_ppm(path: &str, data: &[u8]) -> Result<(), Error> {
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "P6 {} {} 255", WIDTH, HEIGHT)?;
    for pixel in data.chunks_exact(4) {
        let color = PremulRGBA::new(pixel[0], pixel[1], pixel[2], pixel[3]).unmultiply();
        file.write_all(&[color.red(), color.green(), color.blue()])?;
    }
    file.flush()?;
    Ok(())
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut data = vec![0u8; WIDTH * HEIGHT * 4];
    let mut canvas = Canvas::new();
    canvas.attach(&mut data, WIDTH, HEIGHT, WIDTH * 4)?;
    tracing::debug_span!("[draw]").in_scope(|| draw(&mut canvas));

    if let Some(buffer) = canvas.detach() {
        let mut stdout = std::io::stdout().lock();
        for y in 0..buffer.height() {
            let line: String = buffer.row(y).iter().copied().map(ascii).collect();
            writeln!(stdout, "{}", line)?;
        }
    }

    if let Some(output) = env::args().nth(1) {
        write_ppm(&output, &data)?;
        tracing::info!("[demo] image saved to {}", output);
    }
    Ok(())
}
