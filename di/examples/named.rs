use fibre_di::{injectable, Container, Injected, Lifetime};

// --- Implementations ---
#[derive(Default)]
struct EmailSender;
impl EmailSender {
  fn send(&self, to: &str, message: &str) -> String {
    format!("Sending email to {}: '{}'", to, message)
  }
}
injectable!(EmailSender);

#[derive(Default)]
struct SmsSender;
impl SmsSender {
  fn send(&self, to: &str, message: &str) -> String {
    format!("Sending SMS to {}: '{}'", to, message)
  }
}
injectable!(SmsSender);

// A notifier that picks its senders by name.
struct Notifier {
  email: Injected<EmailSender>,
  sms: Injected<SmsSender>,
}
impl Default for Notifier {
  fn default() -> Self {
    Self {
      email: Injected::named("primary"),
      sms: Injected::named("backup"),
    }
  }
}
injectable!(Notifier { email, sms });

fn main() {
  let container = Container::new();

  // --- Registration ---
  container.register_named::<EmailSender>("primary", Lifetime::Singleton);
  container.register_named::<SmsSender>("backup", Lifetime::Singleton);
  container.register::<Notifier>(Lifetime::Transient);

  // --- Resolution ---
  let notifier = container.resolve::<Notifier>().unwrap();

  let result1 = notifier.email.send("test@example.com", "Hello from Fibre!");
  let result2 = notifier.sms.send("+123456789", "Hello from Fibre!");

  println!("{}", result1);
  println!("{}", result2);

  assert!(result1.contains("email"));
  assert!(result2.contains("SMS"));
}
