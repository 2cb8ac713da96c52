use spmcore::data::brick::Brick;
use spmvolume::{kmedians_brick, KMediansOpts};

fn main() {
    // Two interleaved spectrum families on a 16x16 grid
    let (xres, yres, zres) = (16usize, 16usize, 8usize);
    let npix = xres * yres;
    let mut data = vec![0.0; npix * zres];
    for l in 0..zres {
        for pix in 0..npix {
            data[l * npix + pix] = if pix % 2 == 0 {
                1.0 + l as f64
            } else {
                20.0 - l as f64
            };
        }
    }
    let brick = Brick::new(xres, yres, zres, 1e-6, 1e-6, 1.0, data);

    let opts = KMediansOpts {
        k: 2,
        ..KMediansOpts::default()
    };
    let result = kmedians_brick(&brick, &opts, 42).expect("clustering failed");

    println!("Converged: {}", result.converged);
    println!("Iterations: {}", result.iterations_run);
    println!("Cluster sizes: {:?}", result.cluster_sizes);
    println!("Empty cluster events: {}", result.empty_cluster_events);
}
