//! Byte-exact checks of what ends up in the pixel LSBs.
//!
//! Other implementations of this format must read what we write, so the
//! scan order and header layout are pinned here rather than only
//! round-tripped.

use pixelcrypt::{
    crypto::{KdfParams, IV_LEN, SALT_LEN},
    stego::{bytes_to_bits, lsb},
    CodecOptions, Payload, PixelBuffer,
};

fn fast() -> CodecOptions {
    CodecOptions {
        kdf: KdfParams { iterations: 1_000 },
        authenticate: false,
    }
}

fn cover(width: u32, height: u32, channels: u8) -> PixelBuffer {
    let len = width as usize * height as usize * channels as usize;
    let data = (0..len).map(|i| (i * 73 % 256) as u8).collect();
    PixelBuffer::new(width, height, channels, data).unwrap()
}

const SALT: [u8; SALT_LEN] = [0xA5; SALT_LEN];
const IV: [u8; IV_LEN] = [0x3C; IV_LEN];

#[test]
fn header_fields_in_order() {
    let payload = Payload::seal_with("layout", "pw", &SALT, &IV, &fast()).unwrap();
    let frame = payload.to_bytes().unwrap();

    assert_eq!(frame.len(), 36 + 16);
    assert_eq!(&frame[0..4], &16u32.to_be_bytes());
    assert_eq!(&frame[4..20], &SALT);
    assert_eq!(&frame[20..36], &IV);
    assert_eq!(&frame[36..], payload.ciphertext());
}

#[test]
fn frame_bits_land_msb_first_in_rgb_order() {
    let img = cover(20, 20, 3);
    let frame = Payload::seal_with("bits", "pw", &SALT, &IV, &fast())
        .unwrap()
        .to_bytes()
        .unwrap();
    let stego = lsb::embed(&img, &frame).unwrap();

    let bits = bytes_to_bits(&frame);
    for (n, &bit) in bits.iter().enumerate() {
        assert_eq!(stego.as_bytes()[n] & 1 == 1, bit, "sample {n}");
        assert_eq!(stego.as_bytes()[n] & 0xFE, img.as_bytes()[n] & 0xFE, "sample {n}");
    }
    assert_eq!(&stego.as_bytes()[bits.len()..], &img.as_bytes()[bits.len()..]);
}

#[test]
fn length_field_of_empty_message() {
    // Empty message -> 16 ciphertext bytes -> 00 00 00 10.
    let img = cover(20, 20, 3);
    let stego = pixelcrypt::encode_with_options(&img, "", "pw", &fast()).unwrap();
    let lsbs: Vec<u8> = stego.as_bytes()[..32].iter().map(|s| s & 1).collect();

    let mut expected = vec![0u8; 32];
    expected[27] = 1;
    assert_eq!(lsbs, expected);
}

#[test]
fn rgba_scan_skips_alpha_samples() {
    let img = cover(20, 20, 4);
    let frame = Payload::seal_with("rgba", "pw", &SALT, &IV, &fast())
        .unwrap()
        .to_bytes()
        .unwrap();
    let stego = lsb::embed(&img, &frame).unwrap();

    let bits = bytes_to_bits(&frame);
    for (n, &bit) in bits.iter().enumerate() {
        let idx = (n / 3) * 4 + n % 3;
        assert_eq!(stego.as_bytes()[idx] & 1 == 1, bit, "bit {n}");
    }
    for (i, (a, b)) in img.as_bytes().iter().zip(stego.as_bytes()).enumerate() {
        if i % 4 == 3 {
            assert_eq!(a, b, "alpha sample {i} modified");
        }
    }
}

#[test]
fn encode_touches_only_lsbs_of_payload_prefix() {
    let img = cover(40, 40, 3);
    let message = "only the prefix";
    let stego = pixelcrypt::encode_with_options(&img, message, "pw", &fast()).unwrap();

    let used = pixelcrypt::payload_len_for(message.len(), &fast()) * 8;
    for (n, (a, b)) in img.as_bytes().iter().zip(stego.as_bytes()).enumerate() {
        assert_eq!(a & 0xFE, b & 0xFE, "upper bits of sample {n} changed");
        if n >= used {
            assert_eq!(a, b, "sample {n} past the payload changed");
        }
    }
}

#[test]
fn pinned_salt_and_iv_are_reproducible() {
    let img = cover(20, 20, 3);
    let frame = |msg: &str| {
        Payload::seal_with(msg, "pw", &SALT, &IV, &fast())
            .unwrap()
            .to_bytes()
            .unwrap()
    };
    let a = lsb::embed(&img, &frame("same")).unwrap();
    let b = lsb::embed(&img, &frame("same")).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, lsb::embed(&img, &frame("diff")).unwrap());
}

#[test]
fn hand_built_stego_decodes() {
    let img = cover(20, 20, 3);
    let frame = Payload::seal_with("assembled by hand", "pw", &SALT, &IV, &fast())
        .unwrap()
        .to_bytes()
        .unwrap();
    let stego = lsb::embed(&img, &frame).unwrap();
    assert_eq!(
        pixelcrypt::decode_with_options(&stego, "pw", &fast()).unwrap(),
        "assembled by hand"
    );
}

#[test]
fn tag_follows_ciphertext() {
    let tagged = CodecOptions {
        authenticate: true,
        ..fast()
    };
    let plain = Payload::seal_with("tag", "pw", &SALT, &IV, &fast()).unwrap();
    let with_tag = Payload::seal_with("tag", "pw", &SALT, &IV, &tagged).unwrap();

    let plain_bytes = plain.to_bytes().unwrap();
    let tagged_bytes = with_tag.to_bytes().unwrap();
    assert_eq!(tagged_bytes.len(), plain_bytes.len() + 32);
    assert_eq!(&tagged_bytes[..plain_bytes.len()], &plain_bytes[..]);
    assert_eq!(&tagged_bytes[plain_bytes.len()..], &with_tag.tag().unwrap()[..]);
}
