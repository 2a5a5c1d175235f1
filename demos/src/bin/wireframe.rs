//! Draws a rotating hexagon and a fan of points as ASCII art.
//!
//! The hexagon is drawn as an outline and sticks out of the view volume,
//! so its clipped edges are visible along the border. Pass an angle in
//! degrees as the first argument to rotate it; set `RUST_LOG=debug` to see
//! the pipeline composition.

use std::{env, f32::consts::TAU};

use log::info;

use re::prelude::*;
use re::render::{prim::Prim, state::PerWinding};

const W: usize = 64;
const H: usize = 24;

/// Plots every point, line, and triangle edge it receives into a grid
/// of characters.
struct Canvas {
    buf: [[char; W]; H],
}

impl Canvas {
    fn new() -> Self {
        Self { buf: [['.'; W]; H] }
    }

    fn plot(&mut self, x: f32, y: f32, ch: char) {
        let (x, y) = (x.floor(), y.floor());
        if (0.0..W as f32).contains(&x) && (0.0..H as f32).contains(&y) {
            self.buf[y as usize][x as usize] = ch;
        }
    }

    fn segment(&mut self, a: &ShadedVertex, b: &ShadedVertex) {
        let (dx, dy) = (b.win.x() - a.win.x(), b.win.y() - a.win.y());
        let n = dx.abs().max(dy.abs()).ceil().max(1.0);
        for i in 0..=n as usize {
            let t = i as f32 / n;
            self.plot(a.win.x() + t * dx, a.win.y() + t * dy, '#');
        }
    }
}

impl Sink for Canvas {
    fn point(&mut self, _: &Prim, v: &ShadedVertex) {
        self.plot(v.win.x(), v.win.y(), 'o');
    }
    fn line(&mut self, _: &Prim, [a, b]: [&ShadedVertex; 2]) {
        self.segment(a, b);
    }
    fn tri(&mut self, _: &Prim, [a, b, c]: [&ShadedVertex; 3]) {
        self.segment(a, b);
        self.segment(b, c);
        self.segment(c, a);
    }
}

fn main() {
    env_logger::init();

    let angle = env::args()
        .nth(1)
        .and_then(|a| a.parse::<f32>().ok())
        .unwrap_or(15.0)
        .to_radians();

    let mut ctx = DrawContext::new();
    ctx.set_viewport(Viewport::new(0.0, 0.0, W as f32, H as f32));
    ctx.set_vertex_attributes(VertexLayout::generic(0).expect("valid layout"));
    ctx.set_raster_state(RasterState {
        fill: PerWinding::both(FillMode::Line),
        ..RasterState::default()
    });

    let mut canvas = Canvas::new();

    // Hexagon of radius 1.2, partially outside the view volume
    let mut hexagon = |i: u32, out: &mut VertexOutput| {
        let a = angle + i as f32 * TAU / 6.0;
        out.pos = vec4(1.2 * a.cos(), 1.2 * a.sin(), 0.0, 1.0);
    };
    ctx.draw(
        Topology::Polygon,
        0,
        6,
        &Elements::Linear,
        &mut hexagon,
        &mut canvas,
    );

    // Points along two perpendicular spokes
    let mut spokes = |i: u32, out: &mut VertexOutput| {
        let r = 0.1 * (i % 8) as f32;
        let a = angle + if i < 8 { 0.0 } else { TAU / 4.0 };
        out.pos = vec4(r * a.cos(), r * a.sin(), 0.0, 1.0);
    };
    let idx: Vec<u8> = (1..16).collect();
    ctx.draw(
        Topology::Points,
        0,
        idx.len() as u32,
        &Elements::U8(&idx),
        &mut spokes,
        &mut canvas,
    );

    for row in &canvas.buf {
        println!("{}", row.iter().collect::<String>());
    }
    info!("stages: {:?}", ctx.stage_names().collect::<Vec<_>>());
    info!("\n{}", ctx.stats());
}
