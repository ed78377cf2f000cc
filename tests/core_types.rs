use patchtrack::{Frame, ImageView, OwnedImage, PixelFormat, TrackError};

#[test]
fn image_view_rejects_invalid_dimensions() {
    let data = [0u8; 4];

    let err = ImageView::from_slice(&data, 0, 1).err().unwrap();
    assert_eq!(
        err,
        TrackError::InvalidDimensions {
            width: 0,
            height: 1,
        }
    );

    let err = ImageView::from_slice(&data, 1, 0).err().unwrap();
    assert_eq!(
        err,
        TrackError::InvalidDimensions {
            width: 1,
            height: 0,
        }
    );
}

#[test]
fn image_view_rejects_invalid_stride() {
    let data = [0u8; 8];

    let err = ImageView::new(&data, 4, 1, 3).err().unwrap();
    assert_eq!(
        err,
        TrackError::InvalidStride {
            width: 4,
            stride: 3,
        }
    );
}

#[test]
fn image_view_rejects_small_buffer() {
    let data = [0u8; 3];

    let err = ImageView::new(&data, 2, 2, 2).err().unwrap();
    assert_eq!(err, TrackError::BufferTooSmall { needed: 4, got: 3 });
}

#[test]
fn image_view_roi_matches_expected_values() {
    let data: Vec<u8> = (0u8..16).collect();
    let view = ImageView::from_slice(&data, 4, 4).unwrap();
    assert_eq!(view.stride(), 4);

    let roi = view.roi(1, 1, 2, 2).unwrap();
    assert_eq!(roi.width(), 2);
    assert_eq!(roi.height(), 2);
    assert_eq!(roi.stride(), 4);
    assert_eq!(roi.row(0).unwrap(), &[5u8, 6u8]);
    assert_eq!(roi.row(1).unwrap(), &[9u8, 10u8]);
    assert_eq!(roi.get(0, 0).copied(), Some(5u8));
    assert!(roi.get(2, 0).is_none());

    let err = view.roi(3, 3, 2, 2).err().unwrap();
    assert_eq!(
        err,
        TrackError::RoiOutOfBounds {
            x: 3,
            y: 3,
            width: 2,
            height: 2,
            img_width: 4,
            img_height: 4,
        }
    );
}

#[test]
fn owned_image_round_trips_through_view() {
    let data: Vec<u8> = (0u8..12).collect();
    let img = OwnedImage::new(data.clone(), 4, 3).unwrap();
    let copy = OwnedImage::from_view(img.view()).unwrap();
    assert_eq!(copy.data(), data.as_slice());

    let roi_copy = OwnedImage::from_view(img.view().roi(1, 0, 2, 3).unwrap()).unwrap();
    assert_eq!(roi_copy.data(), &[1, 2, 5, 6, 9, 10]);
}

#[test]
fn owned_image_rejects_wrong_buffer_length() {
    let err = OwnedImage::new(vec![0u8; 5], 2, 2).err().unwrap();
    assert_eq!(err, TrackError::BufferTooSmall { needed: 4, got: 5 });
}

#[test]
fn frame_checks_buffer_against_format() {
    let data = [0u8; 12];
    assert!(Frame::new(&data, 2, 2, PixelFormat::Rgb8).is_ok());
    let err = Frame::new(&data, 2, 2, PixelFormat::Rgba8).err().unwrap();
    assert_eq!(err, TrackError::BufferTooSmall { needed: 16, got: 12 });
}

#[test]
fn zero_dimension_frame_is_representable_but_empty() {
    let frame = Frame::new(&[], 0, 0, PixelFormat::Luma8).unwrap();
    assert!(frame.is_empty());
    assert_eq!(frame.to_luma().err().unwrap(), TrackError::InvalidFrame);
}

#[test]
fn rgb_frame_converts_to_luma() {
    // Two pixels: pure white and pure black.
    let data = [255u8, 255, 255, 0, 0, 0];
    let frame = Frame::new(&data, 2, 1, PixelFormat::Rgb8).unwrap();
    let gray = frame.to_luma().unwrap();
    assert_eq!(gray.data(), &[255, 0]);
}
