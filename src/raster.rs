use crate::im::Im;

/// Grid cells crossed by the segment from `p0` to `p1`, endpoints included,
/// in walk order. The path is 8-connected with no gaps and no duplicates.
pub fn line_pixels(p0: (i32, i32), p1: (i32, i32)) -> Vec<(i32, i32)> {
    let (mut x0, mut y0) = p0;
    let (x1, y1) = p1;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut cells: Vec<(i32, i32)> = Vec::with_capacity((dx - dy) as usize + 1);
    loop {
        cells.push((x0, y0));
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            if x0 == x1 {
                break;
            }
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            if y0 == y1 {
                break;
            }
            err += dx;
            y0 += sy;
        }
    }
    cells
}

/// The 4-connected component of cells equal to the value under `seed`.
///
/// Returns (x, y) cell coordinates in visit order. The seed must be inside
/// the image; neighbors are bounds-checked so the walk never leaves the grid.
pub fn flood_group<T>(src_im: &Im<T, 1>, seed: (usize, usize)) -> Vec<(i32, i32)>
where
    T: Copy + PartialEq,
{
    let w = src_im.w;
    let h = src_im.h;
    let (start_x, start_y) = seed;
    assert!(start_x < w && start_y < h, "seed coords out of bounds");

    let group_val = src_im.at(start_x, start_y, 0);

    let mut visited: Vec<u8> = vec![0; w * h];
    let mut stack: Vec<(usize, usize)> = Vec::with_capacity(w * h / 10 + 64);
    stack.push((start_x, start_y));

    let mut cells: Vec<(i32, i32)> = Vec::new();
    while let Some((x, y)) = stack.pop() {
        let v_i = y * w + x;
        if visited[v_i] != 0 {
            continue;
        }
        visited[v_i] = 1;

        if src_im.at(x, y, 0) != group_val {
            continue;
        }
        cells.push((x as i32, y as i32));

        if y + 1 < h && visited[(y + 1) * w + x] == 0 {
            stack.push((x, y + 1));
        }
        if x + 1 < w && visited[y * w + x + 1] == 0 {
            stack.push((x + 1, y));
        }
        if y > 0 && visited[(y - 1) * w + x] == 0 {
            stack.push((x, y - 1));
        }
        if x > 0 && visited[y * w + x - 1] == 0 {
            stack.push((x - 1, y));
        }
    }

    cells
}

// Tests
// -----------------------------------------------------------------------------
