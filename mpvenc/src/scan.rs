/// Zigzag scan: entry `i` is the raster position of the `i`-th coefficient.
pub const ZIGZAG_8X8: [u8; 64] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];

pub fn zigzag(raster: &[i32; 64]) -> [i32; 64] {
    let mut scanned = [0i32; 64];
    for (i, &pos) in ZIGZAG_8X8.iter().enumerate() {
        scanned[i] = raster[pos as usize];
    }
    scanned
}

pub fn dezigzag(scanned: &[i32; 64]) -> [i32; 64] {
    let mut raster = [0i32; 64];
    for (i, &pos) in ZIGZAG_8X8.iter().enumerate() {
        raster[pos as usize] = scanned[i];
    }
    raster
}
