use crate::models::{BoundingBox, Contour};

/// Reconcile contours found in different thermal bands.
///
/// `band_contours` is ordered coldest first. Bands are visited hottest
/// first and a contour is kept unless its bounding box lies inside the
/// bounding box of a contour already kept from a hotter band. Contours
/// of the same band never reject each other.
pub fn localize(band_contours: &[Vec<Contour>]) -> Vec<Contour> {
    let mut accepted: Vec<Contour> = Vec::new();
    let mut accepted_boxes: Vec<BoundingBox> = Vec::new();

    for contours in band_contours.iter().rev() {
        let hotter = accepted_boxes.len();

        for contour in contours {
            let candidate = contour.bounding_box();
            let enclosed = accepted_boxes[..hotter]
                .iter()
                .any(|kept| kept.contains(&candidate));

            if !enclosed {
                accepted_boxes.push(candidate);
                accepted.push(contour.clone());
            }
        }
    }

    accepted
}
