use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use psiclin_api::appointments::{AppointmentStatus, AppointmentsQuery, NewAppointment};
use psiclin_api::patients::{PatientsQuery, RegisterPatient, UpdatePatient};
use psiclin_client::{ClientConfig, PracticeClient};
use psiclin_store::LocalStore;
use psiclin_types::{Cpf, NonEmptyText, Pagination, PhoneNumber};

#[derive(Parser)]
#[command(name = "psiclin")]
#[command(about = "Psiclin practice management CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and persist the session token
    Login {
        email: String,
        password: String,
    },
    /// Clear the persisted session
    Logout,
    /// List patients
    Patients {
        /// Filter by name
        #[arg(long)]
        name: Option<String>,
        /// Page number (zero-based)
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// Register a patient
    RegisterPatient {
        name: String,
        email: String,
        /// CPF, with or without punctuation
        cpf: String,
        /// Phone number, with or without punctuation
        phone: String,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        date_of_birth: Option<NaiveDate>,
    },
    /// Update a patient; omitted fields are left unchanged
    UpdatePatient {
        patient_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// CPF, with or without punctuation
        #[arg(long)]
        cpf: Option<String>,
        /// Phone number, with or without punctuation
        #[arg(long)]
        phone: Option<String>,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        date_of_birth: Option<NaiveDate>,
    },
    /// List appointments
    Appointments {
        /// Range start (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Range end (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Book an appointment
    BookAppointment {
        patient_id: String,
        /// Scheduled time (RFC 3339)
        scheduled_at: DateTime<Utc>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Confirm, cancel or complete an appointment
    SetAppointmentStatus {
        appointment_id: String,
        /// pending, confirmed, cancelled or completed
        status: String,
    },
    /// List a patient's attachments
    Attachments {
        patient_id: String,
    },
    /// Upload a file as a patient attachment
    UploadAttachment {
        patient_id: String,
        file: PathBuf,
    },
    /// List suggestions
    Suggestions {
        /// Page number (zero-based)
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// Submit a suggestion
    Suggest {
        content: String,
    },
    /// Create an onboarding invite link
    CreateInvite,
    /// Validate an invite hash
    ValidateInvite {
        hash: String,
    },
    /// Show the dashboard aggregates
    Dashboard,
    /// Show the signed-in psychologist's profile
    Profile,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("psiclin=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_url =
        std::env::var("PSICLIN_API_URL").unwrap_or_else(|_| "http://localhost:3000".into());
    let request_delay = std::env::var("PSICLIN_REQUEST_DELAY_MS")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .map(Duration::from_millis);

    let store = LocalStore::open_default()?;
    let client = PracticeClient::new(
        &ClientConfig {
            base_url,
            request_delay,
        },
        store,
    )?;

    let cli = Cli::parse();
    match run(cli.command, &client).await {
        Ok(()) => Ok(()),
        Err(err) if is_unauthorized(&err) => {
            // A rejected token is not coming back; drop the session so the
            // next command starts clean.
            client.sign_out()?;
            anyhow::bail!("session expired, please log in again");
        }
        Err(err) => Err(err),
    }
}

async fn run(command: Commands, client: &PracticeClient) -> anyhow::Result<()> {
    match command {
        Commands::Login { email, password } => {
            client.sign_in(&email, &password).await?;
            println!("Signed in as {email}");
        }
        Commands::Logout => {
            client.sign_out()?;
            println!("Signed out");
        }
        Commands::Patients { name, page } => {
            let query = PatientsQuery {
                pagination: Pagination {
                    page,
                    ..Pagination::default()
                },
                name,
            };
            let patients = client.patients(query).await?;
            println!("{}", serde_json::to_string_pretty(patients.as_ref())?);
        }
        Commands::RegisterPatient {
            name,
            email,
            cpf,
            phone,
            date_of_birth,
        } => {
            let created = client
                .register_patient(RegisterPatient {
                    name,
                    email,
                    cpf: Cpf::new(&cpf)?,
                    phone_number: PhoneNumber::new(&phone)?,
                    date_of_birth,
                })
                .await?;
            println!("Registered patient {}", created.id);
        }
        Commands::UpdatePatient {
            patient_id,
            name,
            email,
            cpf,
            phone,
            date_of_birth,
        } => {
            let updated = client
                .update_patient(
                    &patient_id,
                    UpdatePatient {
                        name,
                        email,
                        cpf: cpf.map(Cpf::new).transpose()?,
                        phone_number: phone.map(PhoneNumber::new).transpose()?,
                        date_of_birth,
                    },
                )
                .await?;
            println!("Updated patient {}", updated.id);
        }
        Commands::Appointments { from, to } => {
            let appointments = client
                .appointments(AppointmentsQuery {
                    from,
                    to,
                    ..AppointmentsQuery::default()
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(appointments.as_ref())?);
        }
        Commands::BookAppointment {
            patient_id,
            scheduled_at,
            notes,
        } => {
            let booked = client
                .create_appointment(NewAppointment {
                    patient_id,
                    scheduled_at,
                    notes,
                })
                .await?;
            println!("Booked appointment {}", booked.id);
        }
        Commands::SetAppointmentStatus {
            appointment_id,
            status,
        } => {
            let updated = client
                .set_appointment_status(&appointment_id, parse_status(&status)?)
                .await?;
            println!("Appointment {} is now {:?}", updated.id, updated.status);
        }
        Commands::Attachments { patient_id } => {
            let attachments = client.patient_attachments(&patient_id).await?;
            for attachment in attachments.iter() {
                println!("{}\t{}", attachment.filename, attachment.url);
            }
        }
        Commands::UploadAttachment { patient_id, file } => {
            let filename = file
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| anyhow::anyhow!("file path has no usable name"))?
                .to_owned();
            let bytes = std::fs::read(&file)?;
            let uploaded = client
                .upload_attachment(&patient_id, &filename, bytes)
                .await?;
            println!("Uploaded {} -> {}", uploaded.filename, uploaded.url);
        }
        Commands::Suggestions { page } => {
            let suggestions = client
                .suggestions(Pagination {
                    page,
                    ..Pagination::default()
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(suggestions.as_ref())?);
        }
        Commands::Suggest { content } => {
            client.submit_suggestion(NonEmptyText::new(&content)?).await?;
            println!("Suggestion submitted");
        }
        Commands::CreateInvite => {
            let invite = client.create_invite().await?;
            println!("{}", invite.url);
        }
        Commands::ValidateInvite { hash } => {
            let validation = client.validate_invite(&hash).await?;
            if validation.valid {
                println!(
                    "Valid invite{}",
                    validation
                        .email
                        .map(|email| format!(" for {email}"))
                        .unwrap_or_default()
                );
            } else {
                println!("Invite is no longer valid");
            }
        }
        Commands::Dashboard => {
            let today = Utc::now().date_naive();
            let month_ago = today - chrono::Days::new(30);
            let ages = client.age_metrics().await?;
            let appointments = client.appointment_metrics(month_ago, today).await?;
            let new_patients = client.new_patient_stats().await?;
            println!("Age distribution:");
            for bucket in ages.iter() {
                println!("  {}\t{}", bucket.range, bucket.count);
            }
            println!("Appointments (last 30 days):");
            for point in appointments.iter() {
                println!("  {}\t{}", point.date, point.total);
            }
            println!("New patients per month:");
            for point in new_patients.iter() {
                println!("  {}\t{}", point.month, point.count);
            }
        }
        Commands::Profile => {
            let profile = client.profile().await?;
            println!("{}", serde_json::to_string_pretty(profile.as_ref())?);
        }
    }
    Ok(())
}

fn parse_status(raw: &str) -> anyhow::Result<AppointmentStatus> {
    match raw {
        "pending" => Ok(AppointmentStatus::Pending),
        "confirmed" => Ok(AppointmentStatus::Confirmed),
        "cancelled" => Ok(AppointmentStatus::Cancelled),
        "completed" => Ok(AppointmentStatus::Completed),
        other => anyhow::bail!("unknown appointment status: {other}"),
    }
}

fn is_unauthorized(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<psiclin_client::ClientError>() {
        Some(psiclin_client::ClientError::Api(psiclin_api::ApiError::Unauthorized)) => true,
        Some(psiclin_client::ClientError::Resource(resource)) => {
            resource.kind == psiclin_cache::ErrorKind::Unauthorized
        }
        _ => false,
    }
}
