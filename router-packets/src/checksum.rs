/// RFC 1071 Internet checksum: the one's complement of the one's complement sum of the data
/// taken as big-endian 16 bit words. An odd trailing byte is padded with a zero byte.
///
/// Running it over a header whose checksum field is already correct yields 0.
pub fn internet_checksum(data: &[u8]) -> u16 {
    let mut sum = data.chunks(2).fold(0u32, |acc, word| {
        let high = u32::from(word[0]) << 8;
        let low = word.get(1).map_or(0, |b| u32::from(*b));
        acc + (high | low)
    });
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}
