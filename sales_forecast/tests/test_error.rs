use sales_forecast::{AugmentationError, ForecastError};
use sales_math::MathError;

#[test]
fn test_input_errors() {
    let errors = [
        ForecastError::NoData("store-1".to_string()),
        ForecastError::InsufficientData {
            found: 3,
            required: 7,
        },
        ForecastError::InvalidRecord("negative total".to_string()),
        ForecastError::InvalidParameter("days".to_string()),
    ];
    for err in &errors {
        assert!(err.is_input_error(), "{} should be an input error", err);
        assert!(!err.is_model_error());
    }
}

#[test]
fn test_model_errors() {
    let model = ForecastError::Model("diverged".to_string());
    let math: ForecastError = MathError::CalculationError("singular".to_string()).into();
    for err in [&model, &math] {
        assert!(err.is_model_error());
        assert!(!err.is_input_error());
    }

    let augmentation: ForecastError = AugmentationError::Timeout(500).into();
    assert!(!augmentation.is_model_error());
    assert!(!augmentation.is_input_error());
}

#[test]
fn test_messages() {
    let err = ForecastError::InsufficientData {
        found: 6,
        required: 7,
    };
    assert_eq!(
        err.to_string(),
        "Insufficient data: found 6 distinct days, need at least 7"
    );

    let err: ForecastError = AugmentationError::Timeout(250).into();
    assert_eq!(
        err.to_string(),
        "Augmentation error: augmentation timed out after 250 ms"
    );
}
