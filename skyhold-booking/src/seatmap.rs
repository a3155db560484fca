use skyhold_domain::{SeatAssignment, SeatConfiguration};

const SEAT_LETTERS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

/// Lay out a seat map from a cabin configuration: rows numbered from 1,
/// first class ahead of business ahead of economy, per-row letters A..F
/// truncated to `seats_per_row`.
pub fn generate_seats(config: &SeatConfiguration) -> Vec<SeatAssignment> {
    let per_row = (config.seats_per_row as usize).min(SEAT_LETTERS.len());
    let mut seats = Vec::new();
    let mut row = 1u32;

    let mut cabin = |rows: u32, class: &str, seats: &mut Vec<SeatAssignment>, row: &mut u32| {
        for _ in 0..rows {
            for letter in &SEAT_LETTERS[..per_row] {
                seats.push(SeatAssignment {
                    seat_no: format!("{row}{letter}"),
                    class: class.to_string(),
                });
            }
            *row += 1;
        }
    };

    cabin(config.first_class_rows, "first", &mut seats, &mut row);
    cabin(config.business_rows, "business", &mut seats, &mut row);
    cabin(config.economy_rows, "economy", &mut seats, &mut row);

    seats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cabins_are_laid_out_front_to_back() {
        let config = SeatConfiguration {
            first_class_rows: 1,
            business_rows: 2,
            economy_rows: 3,
            seats_per_row: 4,
        };
        let seats = generate_seats(&config);

        assert_eq!(seats.len(), 6 * 4);
        assert_eq!(seats[0], SeatAssignment { seat_no: "1A".into(), class: "first".into() });
        assert_eq!(seats[3], SeatAssignment { seat_no: "1D".into(), class: "first".into() });
        assert_eq!(seats[4].class, "business");
        assert_eq!(seats[4].seat_no, "2A");
        assert_eq!(seats[12].class, "economy");
        assert_eq!(seats[12].seat_no, "4A");
        assert_eq!(seats.last().unwrap().seat_no, "6D");
    }

    #[test]
    fn seats_per_row_is_capped_at_six() {
        let config = SeatConfiguration {
            first_class_rows: 0,
            business_rows: 0,
            economy_rows: 1,
            seats_per_row: 9,
        };
        let seats = generate_seats(&config);
        assert_eq!(seats.len(), 6);
        assert_eq!(seats.last().unwrap().seat_no, "1F");
    }

    #[test]
    fn economy_only_layout() {
        let config = SeatConfiguration {
            first_class_rows: 0,
            business_rows: 0,
            economy_rows: 2,
            seats_per_row: 3,
        };
        let seats = generate_seats(&config);
        let numbers: Vec<&str> = seats.iter().map(|s| s.seat_no.as_str()).collect();
        assert_eq!(numbers, ["1A", "1B", "1C", "2A", "2B", "2C"]);
        assert!(seats.iter().all(|s| s.class == "economy"));
    }
}
